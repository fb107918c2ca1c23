//! Scheduler implementation

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use eyre::Result;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::delivery::{Delivery, DeliveryError};
use crate::domain::{ClockTime, UserId};
use crate::policy;
use crate::presenter;
use crate::repository::TaskRepository;

/// Outcome of a single evaluation tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Users with at least one active deadline
    pub users_considered: usize,
    /// Users whose preferences matched this tick's minute and weekday
    pub users_eligible: usize,
    /// Messages handed to delivery successfully
    pub delivered: usize,
    /// Deliveries that failed or timed out
    pub failed: usize,
}

/// The scheduler wakes at every minute boundary and evaluates each user
/// with active deadlines. Every tick derives everything from the current
/// clock and the store; no reminder state survives between ticks, so a
/// missed minute is simply skipped, never replayed.
pub struct ReminderScheduler {
    config: SchedulerConfig,
    tz: Tz,
    repo: Arc<dyn TaskRepository>,
    delivery: Arc<dyn Delivery>,
    in_flight: Arc<Mutex<()>>,
}

impl ReminderScheduler {
    /// Create a new scheduler
    pub fn new(config: SchedulerConfig, tz: Tz, repo: Arc<dyn TaskRepository>, delivery: Arc<dyn Delivery>) -> Self {
        debug!(?config, %tz, "ReminderScheduler::new: called");
        Self {
            config,
            tz,
            repo,
            delivery,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Run the scheduler loop until shutdown is signalled.
    ///
    /// Each tick runs on its own task; if a tick overruns into the next
    /// minute boundary, the overlapping tick is skipped rather than
    /// queued behind it.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        info!(tz = %self.tz, "ReminderScheduler started");

        loop {
            let delay = until_next_minute(Utc::now());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => {
                    info!("ReminderScheduler shutting down");
                    return Ok(());
                }
            }

            let now = Utc::now().with_timezone(&self.tz);
            self.spawn_tick(now);
        }
    }

    /// Start a tick on its own task unless the previous one is still in
    /// flight, in which case this minute is skipped. Returns whether a
    /// tick was started.
    pub fn spawn_tick(self: &Arc<Self>, now: DateTime<Tz>) -> bool {
        let Ok(guard) = self.in_flight.clone().try_lock_owned() else {
            warn!("Previous tick still running, skipping this minute");
            return false;
        };

        let scheduler = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match scheduler.tick_once(now).await {
                Ok(report) => debug!(?report, "Tick complete"),
                Err(e) => error!(error = %e, "Tick failed"),
            }
        });
        true
    }

    /// Evaluate a single tick at the given local time.
    ///
    /// A repository failure listing users aborts the whole tick; per-user
    /// failures are contained and never affect other users.
    pub async fn tick_once(&self, now: DateTime<Tz>) -> Result<TickReport> {
        let minute = ClockTime::new(now.hour() as u8, now.minute() as u8)
            .map_err(|e| eyre::eyre!("clock produced invalid time: {}", e))?;
        let weekday = now.weekday().num_days_from_monday() as u8;
        debug!(%minute, weekday, "tick_once: evaluating");

        let users = self.repo.users_with_active_deadlines().await?;

        let mut report = TickReport {
            users_considered: users.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();
        for user_id in users {
            let prefs = match self.repo.notification_preferences(user_id).await {
                Ok(prefs) => prefs,
                Err(e) => {
                    error!(user_id, error = %e, "Failed to load preferences, skipping user");
                    continue;
                }
            };
            if !prefs.is_eligible(minute, weekday) {
                continue;
            }
            report.users_eligible += 1;

            let repo = self.repo.clone();
            let delivery = self.delivery.clone();
            let timeout = Duration::from_millis(self.config.deliver_timeout_ms);
            handles.push(tokio::spawn(async move {
                evaluate_user(repo, delivery, timeout, user_id, now).await
            }));
        }

        for result in futures::future::join_all(handles).await {
            match result {
                Ok(Ok(true)) => report.delivered += 1,
                Ok(Ok(false)) => {}
                Ok(Err(())) => report.failed += 1,
                Err(e) => {
                    error!(error = %e, "User evaluation task panicked");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Evaluate one eligible user: fetch, classify, render, deliver.
///
/// Returns Ok(true) if a message was delivered, Ok(false) if the user
/// had nothing to say this tick, Err(()) on a contained failure.
async fn evaluate_user(
    repo: Arc<dyn TaskRepository>,
    delivery: Arc<dyn Delivery>,
    deliver_timeout: Duration,
    user_id: UserId,
    now: DateTime<Tz>,
) -> Result<bool, ()> {
    let deadlines = match repo.active_deadlines_for(user_id).await {
        Ok(deadlines) => deadlines,
        Err(e) => {
            error!(user_id, error = %e, "Failed to load deadlines");
            return Err(());
        }
    };

    let classified = policy::classify(deadlines, now);
    let Some(notification) = policy::select(classified) else {
        debug!(user_id, "Nothing to notify this tick");
        return Ok(false);
    };

    let settings = match repo.display_settings(user_id).await {
        Ok(settings) => settings,
        Err(e) => {
            error!(user_id, error = %e, "Failed to load display settings");
            return Err(());
        }
    };

    let text = presenter::render(&notification, &settings);

    let result = match tokio::time::timeout(deliver_timeout, delivery.send(user_id, &text)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(deliver_timeout)),
    };

    match result {
        Ok(()) => {
            info!(user_id, "Notification delivered");
            Ok(true)
        }
        Err(e) => {
            error!(user_id, error = %e, "Delivery failed, message dropped");
            Err(())
        }
    }
}

/// Delay from `now` to the next minute boundary, at least 1ms
fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let elapsed_ms = now.second() as u64 * 1000 + now.timestamp_subsec_millis() as u64;
    Duration::from_millis((60_000u64.saturating_sub(elapsed_ms)).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_until_next_minute() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 30).unwrap();
        assert_eq!(until_next_minute(now), Duration::from_millis(30_000));

        let boundary = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(until_next_minute(boundary), Duration::from_millis(60_000));
    }
}
