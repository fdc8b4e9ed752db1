//! Spyfall game-session client library.
//!
//! Two independent pieces share the game view's lifecycle: a countdown
//! synchronizer that renders the remaining round time against a fixed anchor,
//! and a live update channel that consumes the server's event stream.

pub mod channel;
pub mod countdown;
pub mod error;
pub mod lobby;
pub mod view;

pub use error::ClientError;
