//! Live channel connection and its background stream task.

use std::{cell::Cell, sync::Arc};

use futures_util::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use reqwest::{
    StatusCode, Url,
    header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, COOKIE},
};
use tokio::{sync::watch, task::JoinHandle};

use crate::error::ClientError;

use super::{
    config::ChannelConfig,
    observer::ChannelObserver,
    sse::{EventStreamParser, MessageEvent},
    state::ReadyState,
};

const EVENT_STREAM_MIME: &str = "text/event-stream";

/// State shared between the channel handle and its stream task.
///
/// Observer callbacks run while `state` is locked. The lock is re-entrant, so
/// a callback may query or close the channel, while a [`LiveChannel::close`]
/// from another thread waits for the running callback to return.
struct Shared {
    state: ReentrantMutex<Cell<ReadyState>>,
    state_tx: watch::Sender<ReadyState>,
    observers: Vec<Arc<dyn ChannelObserver>>,
}

impl Shared {
    fn transition_locked(&self, state: &Cell<ReadyState>, next: ReadyState) -> bool {
        let current = state.get();
        if !current.can_transition_to(next) {
            return false;
        }
        tracing::debug!("Channel state {} -> {}", current, next);
        state.set(next);
        self.state_tx.send_replace(next);
        true
    }

    fn transition(&self, next: ReadyState) -> bool {
        let state = self.state.lock();
        self.transition_locked(&state, next)
    }

    fn current(&self) -> ReadyState {
        self.state.lock().get()
    }

    /// Move to `Open` and notify observers; `false` if the channel was closed meanwhile
    fn open(&self) -> bool {
        let state = self.state.lock();
        if !self.transition_locked(&state, ReadyState::Open) {
            return false;
        }
        for observer in &self.observers {
            if state.get() != ReadyState::Open {
                return false;
            }
            observer.on_open();
        }
        state.get() == ReadyState::Open
    }

    /// Forward one event; `false` once the channel is no longer open
    fn deliver(&self, event: &MessageEvent) -> bool {
        let state = self.state.lock();
        for observer in &self.observers {
            if state.get() != ReadyState::Open {
                return false;
            }
            observer.on_message(event);
        }
        state.get() == ReadyState::Open
    }

    fn fail(&self, error: ClientError) {
        let state = self.state.lock();
        if !self.transition_locked(&state, ReadyState::Errored) {
            tracing::debug!("Ignoring error on {} channel: {}", state.get(), error);
            return;
        }
        for observer in &self.observers {
            observer.on_error(&error);
        }
    }
}

/// One-directional server-push connection.
///
/// Exactly one connection attempt is made per instance. After an error or
/// [`LiveChannel::close`] the instance stays terminal; there is no reconnect.
pub struct LiveChannel {
    config: ChannelConfig,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveChannel {
    /// Open a channel with a default HTTP client.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the HTTP client cannot be built.
    pub fn open(
        config: ChannelConfig,
        observers: Vec<Arc<dyn ChannelObserver>>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::open_with_client(client, config, observers))
    }

    /// Open a channel on an existing HTTP client.
    ///
    /// Returns immediately in the `Connecting` state; the connection is
    /// established in the background with no deadline.
    pub fn open_with_client(
        client: reqwest::Client,
        config: ChannelConfig,
        observers: Vec<Arc<dyn ChannelObserver>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ReadyState::Connecting);
        let shared = Arc::new(Shared {
            state: ReentrantMutex::new(Cell::new(ReadyState::Connecting)),
            state_tx,
            observers,
        });

        tracing::info!(
            "EventSource with_credentials={} ready_state={} url={}",
            config.with_credentials,
            ReadyState::Connecting.as_u16(),
            config.url
        );

        let task = tokio::spawn(run_stream(client, config.clone(), shared.clone()));

        Self {
            config,
            shared,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.shared.current()
    }

    pub fn url(&self) -> &Url {
        &self.config.url
    }

    pub fn with_credentials(&self) -> bool {
        self.config.with_credentials
    }

    /// Watch ready-state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ReadyState> {
        self.shared.state_tx.subscribe()
    }

    /// Tear the connection down.
    ///
    /// No observer callback fires once this returns. May be called from inside
    /// an observer callback. Calling it again, or on a channel that already
    /// failed, does nothing.
    pub fn close(&self) {
        if self.shared.transition(ReadyState::Closed) {
            tracing::info!("Connection closed");
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_stream(client: reqwest::Client, config: ChannelConfig, shared: Arc<Shared>) {
    if let Err(e) = stream_events(&client, &config, &shared).await {
        shared.fail(e);
    }
}

/// Returns `Ok` only when the channel was closed while streaming.
async fn stream_events(
    client: &reqwest::Client,
    config: &ChannelConfig,
    shared: &Shared,
) -> Result<(), ClientError> {
    let mut request = client
        .get(config.url.clone())
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache");
    if let Some(cookie) = config.cookie_header() {
        request = request.header(COOKIE, cookie);
    }

    let response = request.send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ClientError::UnexpectedStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_event_stream(&content_type) {
        return Err(ClientError::UnexpectedContentType(content_type));
    }

    if !shared.open() {
        return Ok(());
    }

    let mut parser = EventStreamParser::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for event in parser.feed(&chunk) {
            if !shared.deliver(&event) {
                return Ok(());
            }
        }
    }
    parser.finish();

    Err(ClientError::StreamEnded)
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(EVENT_STREAM_MIME))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::channel::observer::MockChannelObserver;

    use super::*;

    fn unreachable_config() -> ChannelConfig {
        // Port 9 (discard) on localhost is expected to refuse connections
        ChannelConfig::for_server("http://127.0.0.1:9").unwrap()
    }

    #[test]
    fn test_is_event_stream_accepts_parameters() {
        // テスト項目: パラメータ付きの Content-Type も event-stream と判定される
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("Text/Event-Stream; charset=utf-8"));
        assert!(!is_event_stream("text/plain"));
        assert!(!is_event_stream(""));
    }

    #[tokio::test]
    async fn test_open_starts_in_connecting_state() {
        // テスト項目: open 直後は Connecting 状態で、設定が参照できる
        // given (前提条件):
        let config = unreachable_config().with_credentials(None);

        // when (操作):
        let channel = LiveChannel::open(config, vec![]).unwrap();

        // then (期待する結果):
        assert_eq!(channel.ready_state(), ReadyState::Connecting);
        assert_eq!(channel.url().as_str(), "http://127.0.0.1:9/events");
        assert!(channel.with_credentials());
        channel.close();
    }

    #[tokio::test]
    async fn test_connection_failure_notifies_error_without_open() {
        // テスト項目: 接続確立前の失敗では on_open なしで on_error が 1 回だけ呼ばれる
        // given (前提条件):
        let mut observer = MockChannelObserver::new();
        observer.expect_on_open().never();
        observer.expect_on_message().never();
        observer
            .expect_on_error()
            .withf(|error| matches!(error, ClientError::Connection(_)))
            .times(1)
            .return_const(());

        // when (操作):
        let channel = LiveChannel::open(unreachable_config(), vec![Arc::new(observer)]).unwrap();
        let mut state = channel.subscribe_state();
        let reached = tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| s.is_terminal()),
        )
        .await
        .is_ok();

        // then (期待する結果):
        assert!(reached);
        assert_eq!(channel.ready_state(), ReadyState::Errored);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        // テスト項目: close を複数回呼んでもパニックせず Closed のまま
        // given (前提条件):
        let channel = LiveChannel::open(unreachable_config(), vec![]).unwrap();

        // when (操作):
        channel.close();
        channel.close();

        // then (期待する結果):
        assert_eq!(channel.ready_state(), ReadyState::Closed);
        assert_eq!(*channel.subscribe_state().borrow(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_close_suppresses_later_errors() {
        // テスト項目: close 後に接続失敗が起きても on_error は呼ばれない
        // given (前提条件):
        let mut observer = MockChannelObserver::new();
        observer.expect_on_error().never();
        observer.expect_on_open().never();
        let channel = LiveChannel::open(unreachable_config(), vec![Arc::new(observer)]).unwrap();

        // when (操作):
        channel.close();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果):
        assert_eq!(channel.ready_state(), ReadyState::Closed);
    }
}
