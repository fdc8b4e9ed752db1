//! Countdown synchronizer and its repeating tick task.

use std::{sync::Arc, time::Duration};

use spyfall_shared::time::{Clock, timestamp_to_rfc3339};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use super::{
    anchor::{CountdownAnchor, ROUND_DURATION_MILLIS},
    display::DisplaySurface,
    format::format_remaining,
};

/// Period of the repeating countdown tick
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The remaining time was written to the timer element
    Rendered(String),
    /// The round is over; the display keeps its last value
    Expired,
    /// The timer element could not be found for this tick
    ElementMissing,
}

/// What the tick task does once the round is over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// End the task on the first expired tick
    #[default]
    StopOnExpiry,
    /// Keep ticking (without writing) until cancelled
    KeepPolling,
}

/// Keeps a timer element in step with a fixed round anchor
pub struct CountdownSynchronizer {
    surface: Arc<dyn DisplaySurface>,
    clock: Arc<dyn Clock>,
    anchor: CountdownAnchor,
}

impl CountdownSynchronizer {
    /// Anchor a standard-length round at the current instant.
    ///
    /// Returns `None` if the surface has no timer element; in that case no
    /// anchor is stamped and no timer should be armed.
    pub fn initialize(surface: Arc<dyn DisplaySurface>, clock: Arc<dyn Clock>) -> Option<Self> {
        Self::initialize_with_duration(surface, clock, ROUND_DURATION_MILLIS)
    }

    /// Same as [`CountdownSynchronizer::initialize`] with a custom round length
    pub fn initialize_with_duration(
        surface: Arc<dyn DisplaySurface>,
        clock: Arc<dyn Clock>,
        duration_millis: i64,
    ) -> Option<Self> {
        let Some(timer) = surface.timer() else {
            tracing::warn!("Could not find the timer element.");
            return None;
        };

        let anchor = CountdownAnchor::with_duration(clock.now_millis(), duration_millis);
        let instant = timestamp_to_rfc3339(anchor.start_millis());
        timer.set_date_time(&instant);
        tracing::debug!("Countdown anchored at {} ({} ms)", instant, duration_millis);

        Some(Self {
            surface,
            clock,
            anchor,
        })
    }

    pub fn anchor(&self) -> CountdownAnchor {
        self.anchor
    }

    /// Recompute the remaining time and render it.
    ///
    /// Nothing is written once the round is over, so the last rendered value
    /// stays on display. Expiry is checked first; the element is re-resolved
    /// on every call that still has something to render.
    pub fn tick(&self) -> TickOutcome {
        let remaining = self.anchor.remaining_millis(self.clock.now_millis());
        let Some(text) = format_remaining(remaining) else {
            return TickOutcome::Expired;
        };

        let Some(timer) = self.surface.timer() else {
            tracing::warn!("Could not find the timer element.");
            return TickOutcome::ElementMissing;
        };
        timer.set_text(&text);
        TickOutcome::Rendered(text)
    }

    /// Arm the repeating one-second tick
    pub fn spawn(self, policy: ExpiryPolicy) -> CountdownTask {
        self.spawn_with_period(policy, TICK_PERIOD)
    }

    /// Arm the repeating tick with a custom period.
    ///
    /// The first tick fires one period after arming. Late ticks are delayed
    /// rather than replayed in a burst.
    pub fn spawn_with_period(self, policy: ExpiryPolicy, period: Duration) -> CountdownTask {
        let anchor = self.anchor;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if self.tick() == TickOutcome::Expired && policy == ExpiryPolicy::StopOnExpiry {
                    tracing::info!("Round is over, countdown stopped");
                    break;
                }
            }
        });

        CountdownTask { anchor, handle }
    }
}

/// Handle to a running countdown tick task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct CountdownTask {
    anchor: CountdownAnchor,
    handle: JoinHandle<()>,
}

impl CountdownTask {
    pub fn anchor(&self) -> CountdownAnchor {
        self.anchor
    }

    /// Stop ticking. Safe to call more than once.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the task ends, either on expiry or after [`CountdownTask::cancel`]
    pub async fn join(&mut self) {
        if let Err(e) = (&mut self.handle).await
            && !e.is_cancelled()
        {
            tracing::error!("Countdown task failed: {}", e);
        }
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use spyfall_shared::time::ManualClock;

    use crate::countdown::{MemorySurface, TimerElement};

    use super::*;

    const T0: i64 = 1_700_000_000_000;

    type Fixture = (Arc<MemorySurface>, ManualClock, Option<CountdownSynchronizer>);

    fn setup(surface: MemorySurface) -> Fixture {
        let surface = Arc::new(surface);
        let clock = ManualClock::new(T0);
        let synchronizer =
            CountdownSynchronizer::initialize(surface.clone(), Arc::new(clock.clone()));
        (surface, clock, synchronizer)
    }

    #[test]
    fn test_initialize_stamps_anchor_on_element() {
        // テスト項目: 初期化時に現在時刻がアンカーとして要素の属性に書き込まれる
        // given (前提条件):
        let (surface, _clock, synchronizer) = setup(MemorySurface::with_timer());

        // when (操作):
        let synchronizer = synchronizer.unwrap();

        // then (期待する結果):
        assert_eq!(synchronizer.anchor(), CountdownAnchor::new(T0));
        let element = surface.element().unwrap();
        assert_eq!(element.date_time(), Some(timestamp_to_rfc3339(T0)));
        assert_eq!(element.write_count(), 0);
    }

    #[test]
    fn test_initialize_without_element_arms_nothing() {
        // テスト項目: タイマー要素がない場合は初期化されず、パニックもしない
        // given (前提条件):
        let (surface, _clock, synchronizer) = setup(MemorySurface::empty());

        // when (操作) / then (期待する結果):
        assert!(synchronizer.is_none());
        assert!(surface.element().is_none());
    }

    #[test]
    fn test_tick_renders_remaining_time() {
        // テスト項目: tick で残り時間が MM:SS で表示される
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let synchronizer = synchronizer.unwrap();

        // when (操作):
        clock.set(T0 + 239_000);
        let outcome = synchronizer.tick();

        // then (期待する結果):
        assert_eq!(outcome, TickOutcome::Rendered("01:01".to_string()));
        assert_eq!(surface.element().unwrap().text(), "01:01");
    }

    #[test]
    fn test_tick_freezes_display_after_expiry() {
        // テスト項目: ラウンド終了後は表示が更新されず、最後の値のまま残る
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let synchronizer = synchronizer.unwrap();

        // when (操作):
        clock.set(T0 + 299_000);
        let before = synchronizer.tick();
        clock.set(T0 + 300_500);
        let after = synchronizer.tick();
        clock.set(T0 + 900_000);
        let much_later = synchronizer.tick();

        // then (期待する結果):
        assert_eq!(before, TickOutcome::Rendered("00:01".to_string()));
        assert_eq!(after, TickOutcome::Expired);
        assert_eq!(much_later, TickOutcome::Expired);
        let element = surface.element().unwrap();
        assert_eq!(element.text(), "00:01");
        assert_eq!(element.write_count(), 1);
    }

    #[test]
    fn test_tick_tolerates_element_removed_between_ticks() {
        // テスト項目: tick の間に要素が削除・再作成されても毎回取り直して動作する
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let synchronizer = synchronizer.unwrap();

        // when (操作):
        surface.unmount();
        clock.advance(1_000);
        let missing = synchronizer.tick();
        let remounted = surface.mount();
        clock.advance(1_000);
        let rendered = synchronizer.tick();

        // then (期待する結果):
        assert_eq!(missing, TickOutcome::ElementMissing);
        assert_eq!(rendered, TickOutcome::Rendered("04:58".to_string()));
        assert_eq!(remounted.text(), "04:58");
    }

    #[test]
    fn test_tick_does_not_accumulate_skipped_ticks() {
        // テスト項目: tick が遅延・スキップされても表示はアンカーから再計算される
        // given (前提条件):
        let (_surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let synchronizer = synchronizer.unwrap();

        // when (操作): 不規則な間隔で tick する
        clock.set(T0 + 1_000);
        synchronizer.tick();
        clock.set(T0 + 45_700);
        synchronizer.tick();
        clock.set(T0 + 61_000);
        let outcome = synchronizer.tick();

        // then (期待する結果):
        assert_eq!(outcome, TickOutcome::Rendered("03:59".to_string()));
    }

    #[test]
    fn test_tick_reports_expiry_without_element() {
        // テスト項目: 期限切れ後は要素がなくても ElementMissing ではなく Expired になる
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let synchronizer = synchronizer.unwrap();
        surface.unmount();

        // when (操作):
        clock.set(T0 + 299_000);
        let before_deadline = synchronizer.tick();
        clock.set(T0 + 400_000);
        let after_deadline = synchronizer.tick();

        // then (期待する結果):
        assert_eq!(before_deadline, TickOutcome::ElementMissing);
        assert_eq!(after_deadline, TickOutcome::Expired);
    }

    #[tokio::test]
    async fn test_spawned_task_stops_on_expiry_with_element_missing() {
        // テスト項目: 要素が削除されたままでも、ラウンド終了でタスクが終了する
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        surface.unmount();
        let mut task = synchronizer
            .unwrap()
            .spawn_with_period(ExpiryPolicy::StopOnExpiry, Duration::from_millis(10));

        // when (操作):
        clock.set(T0 + 400_000);
        tokio::time::timeout(Duration::from_secs(2), task.join())
            .await
            .expect("countdown task should stop after expiry");

        // then (期待する結果):
        assert!(task.is_finished());
    }

    #[tokio::test]
    async fn test_spawned_task_stops_on_expiry() {
        // テスト項目: StopOnExpiry の場合、ラウンド終了でタスクが終了する
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let mut task = synchronizer
            .unwrap()
            .spawn_with_period(ExpiryPolicy::StopOnExpiry, Duration::from_millis(10));

        // when (操作):
        clock.set(T0 + 298_000);
        tokio::time::sleep(Duration::from_millis(50)).await;
        clock.set(T0 + 300_000);
        tokio::time::timeout(Duration::from_secs(2), task.join())
            .await
            .expect("countdown task should stop after expiry");

        // then (期待する結果):
        assert!(task.is_finished());
        assert_eq!(surface.element().unwrap().text(), "00:02");
    }

    #[tokio::test]
    async fn test_spawned_task_keeps_polling_until_cancelled() {
        // テスト項目: KeepPolling の場合、終了後も cancel されるまでタスクが動き続ける
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        let mut task = synchronizer
            .unwrap()
            .spawn_with_period(ExpiryPolicy::KeepPolling, Duration::from_millis(10));

        // when (操作):
        clock.set(T0 + 301_000);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // then (期待する結果):
        assert!(!task.is_finished());
        assert_eq!(surface.element().unwrap().write_count(), 0);

        task.cancel();
        task.cancel();
        task.join().await;
        assert!(task.is_finished());
    }

    #[tokio::test]
    async fn test_spawned_task_survives_missing_element() {
        // テスト項目: 要素が見つからない tick があってもタスクは止まらない
        // given (前提条件):
        let (surface, clock, synchronizer) = setup(MemorySurface::with_timer());
        surface.unmount();
        let task = synchronizer
            .unwrap()
            .spawn_with_period(ExpiryPolicy::StopOnExpiry, Duration::from_millis(10));

        // when (操作):
        tokio::time::sleep(Duration::from_millis(40)).await;
        let remounted = surface.mount();
        clock.advance(5_000);
        tokio::time::sleep(Duration::from_millis(40)).await;

        // then (期待する結果):
        assert!(!task.is_finished());
        assert_eq!(remounted.text(), "04:55");
    }
}
