//! Deadliner - deadline reminder daemon
//!
//! Deadliner watches a user's deadlines and pushes reminders at the
//! times they asked for, ordered by how urgent each deadline actually
//! is right now.
//!
//! # Core Concepts
//!
//! - **Stateless ticks**: every evaluation derives everything from the
//!   clock and the store; no reminder state survives between minutes
//! - **Score-driven ordering**: a pure function of weight and remaining
//!   time ranks deadlines, and the same score drives message selection
//! - **One message per tick**: urgent beats regular, and each tier is
//!   truncated to its cap rather than flooding the user
//!
//! # Modules
//!
//! - [`domain`] - Deadlines, weights, and per-user preferences
//! - [`importance`] - Scoring and severity labels
//! - [`policy`] - Which deadlines make it into a notification
//! - [`presenter`] - Message rendering
//! - [`scheduler`] - The minute-aligned evaluation loop
//! - [`repository`] - Timezone-aware access to the store
//! - [`delivery`] - Push transport
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod daemon;
pub mod delivery;
pub mod domain;
pub mod importance;
pub mod policy;
pub mod presenter;
pub mod repository;
pub mod scheduler;

// Re-export commonly used types
pub use config::{Config, DeliveryConfig, SchedulerConfig, StorageConfig};
pub use delivery::{Delivery, DeliveryError, PushDelivery};
pub use domain::{ClockTime, Deadline, DeadlineId, DisplaySettings, NotificationPreferences, UserId, Weight};
pub use policy::{Classified, Notification, Scored};
pub use repository::{RepositoryError, StoreRepository, TaskRepository};
pub use scheduler::{ReminderScheduler, TickReport};
