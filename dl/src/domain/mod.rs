//! Domain types for the deadliner daemon

mod deadline;
mod prefs;

pub use deadline::{Deadline, DeadlineId, UserId, Weight, WeightError};
pub use prefs::{ClockTime, ClockTimeError, DisplaySettings, NotificationPreferences};
