//! Incremental decoder for `text/event-stream` bodies.
//!
//! Framing follows the HTML Living Standard: lines end with LF, CRLF or CR,
//! fields are `name: value`, and a blank line dispatches the buffered event.

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default event type for events without an `event` field
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One dispatched server-sent event.
///
/// `data` is handed on untouched; its structure is the receiver's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub event_type: String,
    pub data: String,
    pub last_event_id: String,
}

/// Stateful parser fed with arbitrary chunks of the response body
#[derive(Debug, Default)]
pub struct EventStreamParser {
    line: Vec<u8>,
    skip_lf: bool,
    seen_first_line: bool,
    event_type: String,
    data: String,
    last_event_id: String,
    retry_millis: Option<u64>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of bytes and collect every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<MessageEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.end_line(&mut events);
                    self.skip_lf = true;
                }
                _ => self.line.push(byte),
            }
        }

        events
    }

    /// Reconnection delay last announced by the server, if any.
    ///
    /// Recorded for diagnostics only; the channel never reconnects.
    pub fn retry_millis(&self) -> Option<u64> {
        self.retry_millis
    }

    /// Discard any partially received line or event
    pub fn finish(&mut self) {
        self.line.clear();
        self.data.clear();
        self.event_type.clear();
    }

    fn end_line(&mut self, events: &mut Vec<MessageEvent>) {
        let mut raw = std::mem::take(&mut self.line);
        if !self.seen_first_line {
            self.seen_first_line = true;
            if raw.starts_with(BOM) {
                raw.drain(..BOM.len());
            }
        }

        let line = String::from_utf8_lossy(&raw);
        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry_millis = value.parse().ok();
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<MessageEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        let mut data = std::mem::take(&mut self.data);
        if data.is_empty() {
            return None;
        }
        data.pop();

        Some(MessageEvent {
            event_type: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            last_event_id: self.last_event_id.clone(),
        })
    }
}
