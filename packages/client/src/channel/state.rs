//! Ready-state of a live channel.

use std::fmt;

/// Lifecycle phase of a [`LiveChannel`](super::LiveChannel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    /// Closed by the user
    Closed,
    /// Failed at the transport level
    Errored,
}

impl ReadyState {
    /// Whether the channel can never deliver anything again
    pub fn is_terminal(self) -> bool {
        matches!(self, ReadyState::Closed | ReadyState::Errored)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: ReadyState) -> bool {
        match (self, next) {
            (ReadyState::Connecting, ReadyState::Open) => true,
            (
                ReadyState::Connecting | ReadyState::Open,
                ReadyState::Closed | ReadyState::Errored,
            ) => true,
            _ => false,
        }
    }

    /// Numeric form matching the browser `EventSource.readyState` values
    pub fn as_u16(self) -> u16 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closed | ReadyState::Errored => 2,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closed => "closed",
            ReadyState::Errored => "errored",
        };
        f.write_str(name)
    }
}
