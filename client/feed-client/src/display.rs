//! Timestamp rendering for feeds and message lists

use chrono::NaiveDateTime;

/// Compact relative age: `just now`, `5m`, `3h`, `2d`, then a calendar date.
///
/// Timestamps in the future (clock skew between client and server) render as
/// `just now`.
pub fn relative_time(created_at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let seconds = elapsed.num_seconds();

    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3_600 {
        format!("{}m", elapsed.num_minutes())
    } else if seconds < 86_400 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_days() <= 7 {
        format!("{}d", elapsed.num_days())
    } else {
        created_at.format("%b %-d, %Y").to_string()
    }
}
