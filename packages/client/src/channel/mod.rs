//! Live update channel over a server-sent event stream.
//!
//! The channel delivers payloads without interpreting them. Once it is closed
//! or has failed it is never reopened; a new [`LiveChannel`] must be created.

mod config;
mod connection;
mod observer;
pub mod sse;
mod state;

pub use config::{ChannelConfig, EVENTS_PATH};
pub use connection::LiveChannel;
pub use observer::{ChannelObserver, LoggingObserver};
pub use sse::MessageEvent;
pub use state::ReadyState;
