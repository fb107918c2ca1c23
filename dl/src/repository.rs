//! Repository boundary between the daemon and the store
//!
//! This is the single point where persisted timestamps become
//! timezone-aware domain values. Everything downstream (scoring, policy,
//! presenter) can assume `due_at` carries the service timezone.

use async_trait::async_trait;
use chrono_tz::Tz;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use deadlinestore::{DeadlineRow, DeadlineStore, NotificationSettingsRow, StoreError};

use crate::domain::{Deadline, DisplaySettings, NotificationPreferences, UserId, Weight};

/// Errors from repository reads
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Read access the scheduler needs. Implementations must return only
/// non-completed deadlines from `active_deadlines_for`, and a total
/// default (silent) for users without stored preferences.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn active_deadlines_for(&self, user_id: UserId) -> Result<Vec<Deadline>, RepositoryError>;

    async fn users_with_active_deadlines(&self) -> Result<Vec<UserId>, RepositoryError>;

    async fn notification_preferences(&self, user_id: UserId) -> Result<NotificationPreferences, RepositoryError>;

    async fn display_settings(&self, user_id: UserId) -> Result<DisplaySettings, RepositoryError>;
}

/// Repository backed by the SQLite [`DeadlineStore`]
pub struct StoreRepository {
    store: Mutex<DeadlineStore>,
    tz: Tz,
}

impl StoreRepository {
    /// Wrap a store, localizing all timestamps into `tz`
    pub fn new(store: DeadlineStore, tz: Tz) -> Self {
        Self {
            store: Mutex::new(store),
            tz,
        }
    }

    /// Convert a stored row into a domain deadline.
    ///
    /// Returns `None` for rows with invalid weight; the row is logged
    /// and skipped so one bad task never aborts the batch.
    fn localize(&self, row: DeadlineRow) -> Option<Deadline> {
        let weight = match Weight::new(row.weight) {
            Ok(w) => w,
            Err(e) => {
                warn!(id = row.id, user_id = row.user_id, error = %e, "Skipping deadline with bad weight");
                return None;
            }
        };

        Some(Deadline {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            due_at: row.due_at.with_timezone(&self.tz),
            weight,
            created_at: row.created_at.with_timezone(&self.tz),
            completed: row.completed,
            completed_at: row.completed_at.map(|t| t.with_timezone(&self.tz)),
        })
    }
}

#[async_trait]
impl TaskRepository for StoreRepository {
    async fn active_deadlines_for(&self, user_id: UserId) -> Result<Vec<Deadline>, RepositoryError> {
        let rows = self.store.lock().await.active_deadlines_for(user_id)?;
        Ok(rows.into_iter().filter_map(|row| self.localize(row)).collect())
    }

    async fn users_with_active_deadlines(&self) -> Result<Vec<UserId>, RepositoryError> {
        Ok(self.store.lock().await.users_with_active_deadlines()?)
    }

    async fn notification_preferences(&self, user_id: UserId) -> Result<NotificationPreferences, RepositoryError> {
        let row = self.store.lock().await.notification_settings(user_id)?;
        Ok(parse_preferences(user_id, &row))
    }

    async fn display_settings(&self, user_id: UserId) -> Result<DisplaySettings, RepositoryError> {
        let row = self.store.lock().await.display_settings(user_id)?;
        Ok(DisplaySettings {
            show_remaining_time: row.show_remaining_time,
            show_description: row.show_description,
            show_importance: row.show_importance,
            show_weight: row.show_weight,
            show_emojis: row.show_emojis,
            show_date: row.show_date,
        })
    }
}

/// Parse a stored preferences row into domain preferences.
///
/// The store validates on write, but rows predating that check (or
/// edited by hand) may still carry bad entries; those are logged and
/// skipped so one bad value never aborts the user's tick.
fn parse_preferences(user_id: UserId, row: &NotificationSettingsRow) -> NotificationPreferences {
    let mut prefs = NotificationPreferences {
        times: Default::default(),
        weekdays: Default::default(),
    };
    for time in &row.times {
        match time.parse() {
            Ok(t) => {
                prefs.times.insert(t);
            }
            Err(e) => warn!(user_id, error = %e, "Skipping unparseable notification time"),
        }
    }
    for &day in &row.weekdays {
        if day <= 6 {
            prefs.weekdays.insert(day);
        } else {
            warn!(user_id, day, "Skipping out-of-range weekday");
        }
    }
    prefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use deadlinestore::NewDeadline;

    fn repo_with_store() -> StoreRepository {
        let store = DeadlineStore::open_in_memory().unwrap();
        store.upsert_user(1, Some("alice"), None).unwrap();
        StoreRepository::new(store, chrono_tz::Europe::Moscow)
    }

    #[tokio::test]
    async fn test_active_deadlines_localized() {
        let repo = repo_with_store();
        {
            let store = repo.store.lock().await;
            store
                .add_deadline(&NewDeadline {
                    user_id: 1,
                    title: "exam".to_string(),
                    description: None,
                    due_at: Utc::now() + Duration::hours(4),
                    weight: 5,
                })
                .unwrap();
        }

        let deadlines = repo.active_deadlines_for(1).await.unwrap();
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].due_at.timezone(), chrono_tz::Europe::Moscow);
        assert_eq!(deadlines[0].weight.get(), 5);
    }

    #[tokio::test]
    async fn test_preferences_roundtrip_through_store() {
        let repo = repo_with_store();
        {
            let store = repo.store.lock().await;
            store
                .set_notification_settings(
                    1,
                    &NotificationSettingsRow {
                        times: vec!["10:00".to_string(), "20:30".to_string()],
                        weekdays: vec![0, 4],
                    },
                )
                .unwrap();
        }

        let prefs = repo.notification_preferences(1).await.unwrap();
        assert_eq!(prefs.times.len(), 2);
        assert!(prefs.times.contains(&"10:00".parse().unwrap()));
        assert_eq!(prefs.weekdays.iter().copied().collect::<Vec<u8>>(), vec![0, 4]);
    }

    #[test]
    fn test_parse_preferences_skips_bad_stored_entries() {
        // Rows written before validation (or edited by hand) may carry
        // junk; parsing drops it instead of failing the tick
        let row = NotificationSettingsRow {
            times: vec!["10:00".to_string(), "not-a-time".to_string()],
            weekdays: vec![0, 6, 9],
        };

        let prefs = parse_preferences(1, &row);
        assert_eq!(prefs.times.len(), 1);
        assert!(prefs.times.contains(&"10:00".parse().unwrap()));
        assert_eq!(prefs.weekdays.iter().copied().collect::<Vec<u8>>(), vec![0, 6]);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_silent_defaults() {
        let repo = repo_with_store();
        let prefs = repo.notification_preferences(42).await.unwrap();
        assert!(prefs.times.is_empty());
        assert_eq!(prefs.weekdays.len(), 7);

        let settings = repo.display_settings(42).await.unwrap();
        assert_eq!(settings, DisplaySettings::default());
    }
}
