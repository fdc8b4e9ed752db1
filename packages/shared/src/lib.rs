//! Utilities shared by the Spyfall client packages.

pub mod logger;
pub mod time;
