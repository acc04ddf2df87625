use chrono::{DateTime, Duration, Utc};

use super::types::{ExpiryStatus, Turn};

pub const DEFAULT_EXPIRY_DAYS: i64 = 30;
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Classify a thread by the time elapsed since its last append.
/// Exactly `threshold` old is still active.
pub fn classify_staleness(
    last_updated: DateTime<Utc>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> ExpiryStatus {
    let elapsed = now - last_updated;
    if elapsed > threshold {
        ExpiryStatus::Expired {
            message: format!(
                "This conversation has been inactive for more than {} days. Consider clearing it to start fresh.",
                threshold.num_days()
            ),
        }
    } else {
        ExpiryStatus::Active
    }
}

/// Last `size` turns in chronological order
pub fn trailing_window(history: &[Turn], size: usize) -> &[Turn] {
    let start = history.len().saturating_sub(size);
    &history[start..]
}
