//! Notification policy: which deadlines warrant a push, and in what order
//!
//! Classifies a user's active deadlines into urgent/regular buckets per
//! evaluation tick, then selects at most one outgoing message. The score
//! plus the raw time-to-deadline fully determine the outcome; nothing is
//! carried over from previous ticks.

use std::cmp::Ordering;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::Deadline;
use crate::importance;

/// Maximum deadlines included in an urgent message
pub const URGENT_LIMIT: usize = 5;

/// Maximum deadlines included in a regular message
pub const REGULAR_LIMIT: usize = 3;

/// A deadline with its per-tick derived values
#[derive(Debug, Clone)]
pub struct Scored {
    pub deadline: Deadline,
    pub score: f64,
    pub hours_until: f64,
}

/// Classification of a user's batch for one tick, most important first
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub urgent: Vec<Scored>,
    pub regular: Vec<Scored>,
}

/// The message a user should receive this tick, already truncated
#[derive(Debug, Clone)]
pub enum Notification {
    Urgent {
        tasks: Vec<Scored>,
    },
    Regular {
        tasks: Vec<Scored>,
        /// Regular-tier deadlines beyond the included ones
        remainder: usize,
    },
}

/// Classify active deadlines into urgent/regular buckets.
///
/// Every deadline is scored before either bucket is ordered, so a
/// partially classified batch is never observable. Imminent deadlines
/// (under an hour out, including overdue) are urgent regardless of
/// score, weight 0 included.
pub fn classify(deadlines: Vec<Deadline>, now: DateTime<Tz>) -> Classified {
    let mut classified = Classified::default();

    for deadline in deadlines {
        if deadline.completed {
            // Repository filters these; guard anyway
            continue;
        }

        let hours_until = importance::hours_remaining(deadline.due_at, now);
        let score = importance::score_from_hours(deadline.weight, hours_until);
        let scored = Scored {
            deadline,
            score,
            hours_until,
        };

        if score > 10.0 || hours_until < 1.0 {
            classified.urgent.push(scored);
        } else if score > 5.0 || hours_until < 24.0 {
            classified.regular.push(scored);
        } else {
            debug!(
                id = scored.deadline.id,
                score, hours_until, "Deadline silent this tick"
            );
        }
    }

    sort_by_score_desc(&mut classified.urgent);
    sort_by_score_desc(&mut classified.regular);
    classified
}

/// Pick the outgoing message for a classified batch, if any.
///
/// Urgent wins over regular; truncation keeps the top of the
/// score-descending order, so the most important items are never the
/// ones dropped.
pub fn select(classified: Classified) -> Option<Notification> {
    if !classified.urgent.is_empty() {
        let mut tasks = classified.urgent;
        tasks.truncate(URGENT_LIMIT);
        return Some(Notification::Urgent { tasks });
    }

    if !classified.regular.is_empty() {
        let mut tasks = classified.regular;
        let remainder = tasks.len().saturating_sub(REGULAR_LIMIT);
        tasks.truncate(REGULAR_LIMIT);
        return Some(Notification::Regular { tasks, remainder });
    }

    None
}

fn sort_by_score_desc(tasks: &mut [Scored]) {
    tasks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::Tz;

    use crate::domain::Weight;

    fn now() -> DateTime<Tz> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
            .unwrap()
            .with_timezone(&chrono_tz::UTC)
    }

    fn deadline(id: i64, weight: u8, due_in: Duration) -> Deadline {
        Deadline {
            id,
            user_id: 1,
            title: format!("task-{}", id),
            description: None,
            due_at: now() + due_in,
            weight: Weight::new(weight).unwrap(),
            created_at: now() - Duration::days(1),
            completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_imminent_is_urgent_regardless_of_weight() {
        let classified = classify(vec![deadline(1, 0, Duration::minutes(30))], now());
        assert_eq!(classified.urgent.len(), 1);
        assert!(classified.regular.is_empty());
    }

    #[test]
    fn test_overdue_is_urgent() {
        let classified = classify(vec![deadline(1, 3, Duration::hours(-2))], now());
        assert_eq!(classified.urgent.len(), 1);
        assert!(classified.urgent[0].score > 100_000.0);
    }

    #[test]
    fn test_distant_low_score_is_silent() {
        // weight 5, due in 240h: score ≈ 4.15, hours ≥ 24 → neither bucket
        let classified = classify(vec![deadline(1, 5, Duration::hours(240))], now());
        assert!(classified.urgent.is_empty());
        assert!(classified.regular.is_empty());
    }

    #[test]
    fn test_due_tomorrow_is_regular() {
        // weight 0 due in 20h: score is 0, but hours < 24 forces regular
        let classified = classify(vec![deadline(1, 0, Duration::hours(20))], now());
        assert!(classified.urgent.is_empty());
        assert_eq!(classified.regular.len(), 1);
    }

    #[test]
    fn test_moderate_score_is_regular() {
        // weight 9 due in 10 days (240h): score = 9 * 200 / 241 ≈ 7.47 → regular
        let classified = classify(vec![deadline(1, 9, Duration::hours(240))], now());
        assert!(classified.urgent.is_empty());
        assert_eq!(classified.regular.len(), 1);
    }

    #[test]
    fn test_completed_never_classified() {
        let mut d = deadline(1, 10, Duration::minutes(5));
        d.completed = true;
        let classified = classify(vec![d], now());
        assert!(classified.urgent.is_empty());
        assert!(classified.regular.is_empty());
    }

    #[test]
    fn test_buckets_ordered_most_important_first() {
        let classified = classify(
            vec![
                deadline(1, 3, Duration::hours(10)),
                deadline(2, 10, Duration::minutes(30)),
                deadline(3, 7, Duration::hours(2)),
            ],
            now(),
        );
        let ids: Vec<i64> = classified.urgent.iter().map(|s| s.deadline.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_urgent_truncation_keeps_top_five_in_order() {
        // Ten urgent tasks with strictly descending importance by weight
        // at a fixed horizon; ids 1..=10, higher id = higher weight
        let deadlines: Vec<Deadline> = (1..=10)
            .map(|id| deadline(id, id as u8, Duration::hours(1 + id)))
            .collect();
        // All are critical zone with weight ≥ 1; make sure they're urgent
        let classified = classify(deadlines, now());
        assert_eq!(classified.urgent.len(), 10);

        let selected = select(classified).unwrap();
        match selected {
            Notification::Urgent { tasks } => {
                assert_eq!(tasks.len(), URGENT_LIMIT);
                let scores: Vec<f64> = tasks.iter().map(|s| s.score).collect();
                let mut sorted = scores.clone();
                sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
                assert_eq!(scores, sorted);
                // The five highest scores among the ten survived
                assert!(tasks.iter().all(|s| s.score >= 100.0));
            }
            _ => panic!("expected urgent notification"),
        }
    }

    #[test]
    fn test_regular_remainder_count() {
        // Five regular-tier tasks (hours < 24, low scores)
        let deadlines: Vec<Deadline> = (1..=5).map(|id| deadline(id, 0, Duration::hours(10 + id))).collect();
        let classified = classify(deadlines, now());
        assert_eq!(classified.regular.len(), 5);

        match select(classified).unwrap() {
            Notification::Regular { tasks, remainder } => {
                assert_eq!(tasks.len(), REGULAR_LIMIT);
                assert_eq!(remainder, 2);
            }
            _ => panic!("expected regular notification"),
        }
    }

    #[test]
    fn test_urgent_wins_over_regular() {
        let classified = classify(
            vec![deadline(1, 0, Duration::minutes(30)), deadline(2, 0, Duration::hours(10))],
            now(),
        );
        match select(classified).unwrap() {
            Notification::Urgent { tasks } => assert_eq!(tasks.len(), 1),
            _ => panic!("expected urgent notification"),
        }
    }

    #[test]
    fn test_empty_batch_selects_nothing() {
        assert!(select(classify(vec![], now())).is_none());
    }
}
