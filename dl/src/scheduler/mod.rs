//! Reminder scheduling
//!
//! Minute-aligned evaluation loop that decides, per user, whether a
//! notification goes out this tick.

mod core;

pub use core::{ReminderScheduler, TickReport};
