// ── Resource records ──
//
// Backend entities as the list pages see them. Fields that drive UI
// logic are typed; anything else the server sends is ignored.

mod assignment;
mod course;
mod duty;
mod review;
mod user;

pub use assignment::Assignment;
pub use course::Course;
pub use duty::{Duty, DutyForm};
pub use review::{GradeUpdate, ReviewReport, ReviewRound, ReviewRow, TeamStatus};
pub use user::{User, UserDirectory};

use chrono::{DateTime, Utc};

/// Timestamps as shown in list columns.
pub(crate) fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
