//! Round countdown synchronized against a fixed start anchor.
//!
//! Every tick recomputes the remaining time from the anchor and the current
//! clock reading, so a late or skipped tick never accumulates drift.

mod anchor;
mod display;
mod format;
mod synchronizer;

pub use anchor::{CountdownAnchor, ROUND_DURATION_MILLIS};
pub use display::{
    DisplaySurface, MemorySurface, MemoryTimer, TIMER_ELEMENT_ID, TerminalSurface, TimerElement,
};
pub use format::format_remaining;
pub use synchronizer::{
    CountdownSynchronizer, CountdownTask, ExpiryPolicy, TICK_PERIOD, TickOutcome,
};
