//! DeadlineStore - SQLite persistence for the deadliner daemon
//!
//! Stores users, deadlines, and per-user notification/display settings.
//! The daemon consumes this crate through its repository boundary; the
//! `ds` binary offers direct inspection and administration.
//!
//! All timestamps are stored as RFC 3339 UTC strings. Localizing them to
//! the service timezone is the repository's job, not the store's - the
//! store never interprets wall-clock time.

pub mod cli;
pub mod config;
mod store;

pub use store::{
    DeadlineRow, DeadlineStore, DisplaySettingsRow, NewDeadline, NotificationSettingsRow, StoreError, StoreStats,
    UpdateDeadline,
};

/// Weight values accepted by the store (mirrors domain validation)
pub const WEIGHT_MIN: u8 = 0;
pub const WEIGHT_MAX: u8 = 10;
