//! The fixed instant a round countdown is measured from.

/// Length of one round of Spyfall (5 minutes).
pub const ROUND_DURATION_MILLIS: i64 = 5 * 60 * 1000;

/// Round start instant plus the round length.
///
/// Created once when the view becomes ready and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownAnchor {
    start_millis: i64,
    duration_millis: i64,
}

impl CountdownAnchor {
    /// Anchor a standard-length round at `start_millis`
    pub fn new(start_millis: i64) -> Self {
        Self::with_duration(start_millis, ROUND_DURATION_MILLIS)
    }

    /// Anchor a round of a custom length at `start_millis`
    pub fn with_duration(start_millis: i64, duration_millis: i64) -> Self {
        Self {
            start_millis,
            duration_millis,
        }
    }

    pub fn start_millis(&self) -> i64 {
        self.start_millis
    }

    pub fn duration_millis(&self) -> i64 {
        self.duration_millis
    }

    /// Instant at which the round is over
    pub fn deadline_millis(&self) -> i64 {
        self.start_millis + self.duration_millis
    }

    /// Time left before the deadline as seen at `now_millis`.
    ///
    /// Zero or negative once the round is over.
    pub fn remaining_millis(&self, now_millis: i64) -> i64 {
        self.deadline_millis() - now_millis
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.remaining_millis(now_millis) <= 0
    }
}
