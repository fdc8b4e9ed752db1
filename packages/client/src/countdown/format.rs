//! `MM:SS` rendering of the remaining round time.

/// Format the remaining time as zero-padded `MM:SS`.
///
/// Minutes and seconds are each taken modulo 60. Returns `None` once the
/// round is over, in which case nothing should be written to the display.
pub fn format_remaining(remaining_millis: i64) -> Option<String> {
    if remaining_millis <= 0 {
        return None;
    }

    let total_seconds = remaining_millis / 1000;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    Some(format!("{:02}:{:02}", minutes, seconds))
}
