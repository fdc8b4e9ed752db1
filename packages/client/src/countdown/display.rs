//! Display surfaces the countdown renders onto.

use std::{io::Write, sync::Arc};

use parking_lot::Mutex;

/// Stable identifier of the countdown element.
pub const TIMER_ELEMENT_ID: &str = "timer";

/// A time-bearing display element.
///
/// Exposes a machine-readable instant attribute and a display text. The
/// synchronizer touches nothing else.
pub trait TimerElement: Send + Sync {
    /// Machine-readable instant attribute, if one has been set
    fn date_time(&self) -> Option<String>;

    fn set_date_time(&self, instant: &str);

    /// Currently displayed text
    fn text(&self) -> String;

    fn set_text(&self, text: &str);
}

/// Where the timer element lives.
///
/// The element is looked up on every call because the surface may replace or
/// remove it during the view's lifetime.
pub trait DisplaySurface: Send + Sync {
    fn timer(&self) -> Option<Arc<dyn TimerElement>>;
}

#[derive(Debug, Default)]
struct TimerState {
    date_time: Option<String>,
    text: String,
    writes: usize,
}

/// In-memory timer element
#[derive(Debug, Default)]
pub struct MemoryTimer {
    state: Mutex<TimerState>,
}

impl MemoryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the display text has been written
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }
}

impl TimerElement for MemoryTimer {
    fn date_time(&self) -> Option<String> {
        self.state.lock().date_time.clone()
    }

    fn set_date_time(&self, instant: &str) {
        self.state.lock().date_time = Some(instant.to_string());
    }

    fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    fn set_text(&self, text: &str) {
        let mut state = self.state.lock();
        state.text = text.to_string();
        state.writes += 1;
    }
}

/// In-memory surface whose timer element can be mounted and unmounted at will
#[derive(Debug, Default)]
pub struct MemorySurface {
    timer: Mutex<Option<Arc<MemoryTimer>>>,
}

impl MemorySurface {
    /// Surface without a timer element
    pub fn empty() -> Self {
        Self::default()
    }

    /// Surface with a freshly mounted timer element
    pub fn with_timer() -> Self {
        let surface = Self::empty();
        surface.mount();
        surface
    }

    /// Mount a new timer element, replacing any existing one
    pub fn mount(&self) -> Arc<MemoryTimer> {
        let timer = Arc::new(MemoryTimer::new());
        *self.timer.lock() = Some(timer.clone());
        timer
    }

    /// Remove the timer element, returning it if one was mounted
    pub fn unmount(&self) -> Option<Arc<MemoryTimer>> {
        self.timer.lock().take()
    }

    /// The concretely typed element, for inspection
    pub fn element(&self) -> Option<Arc<MemoryTimer>> {
        self.timer.lock().clone()
    }
}

impl DisplaySurface for MemorySurface {
    fn timer(&self) -> Option<Arc<dyn TimerElement>> {
        self.element().map(|timer| timer as Arc<dyn TimerElement>)
    }
}

/// Timer element that redraws a single terminal line
#[derive(Debug)]
pub struct TerminalTimer {
    label: String,
    inner: MemoryTimer,
}

impl TimerElement for TerminalTimer {
    fn date_time(&self) -> Option<String> {
        self.inner.date_time()
    }

    fn set_date_time(&self, instant: &str) {
        self.inner.set_date_time(instant);
    }

    fn text(&self) -> String {
        self.inner.text()
    }

    fn set_text(&self, text: &str) {
        self.inner.set_text(text);
        print!("\r{} {}", self.label, text);
        std::io::stdout().flush().ok();
    }
}

/// Surface backed by the process's standard output
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    timer: Arc<TerminalTimer>,
}

impl TerminalSurface {
    /// Create a terminal surface, prefixing the countdown with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            timer: Arc::new(TerminalTimer {
                label: label.into(),
                inner: MemoryTimer::new(),
            }),
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn timer(&self) -> Option<Arc<dyn TimerElement>> {
        Some(self.timer.clone())
    }
}
