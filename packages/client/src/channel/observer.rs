//! Observers notified of channel lifecycle transitions and messages.

use crate::error::ClientError;

use super::sse::MessageEvent;

/// Receives callbacks from a [`LiveChannel`](super::LiveChannel).
///
/// `on_open` fires at most once and always before any `on_message`.
/// `on_error` may fire without a preceding `on_open`. Callbacks run on the
/// channel's task; they may query or close the channel.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelObserver: Send + Sync {
    fn on_open(&self) {}

    fn on_message(&self, _event: &MessageEvent) {}

    fn on_error(&self, _error: &ClientError) {}
}

/// Writes every transition and payload to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl ChannelObserver for LoggingObserver {
    fn on_open(&self) {
        tracing::info!("Connection to server opened.");
    }

    fn on_message(&self, event: &MessageEvent) {
        tracing::info!("message: {}", event.data);
    }

    fn on_error(&self, error: &ClientError) {
        tracing::warn!("EventSource failed. ({})", error);
    }
}
