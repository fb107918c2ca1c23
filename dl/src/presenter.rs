//! Rendering of notification messages
//!
//! Pure formatting over an already-truncated, already-ordered task list.
//! The policy decides what goes out; this module only decides how it
//! reads. Display settings toggle the optional lines per user.

use chrono::Duration;

use crate::domain::DisplaySettings;
use crate::importance::{weight_glyph, Severity};
use crate::policy::{Notification, Scored};

/// Render the selected notification to push-message text
pub fn render(notification: &Notification, settings: &DisplaySettings) -> String {
    match notification {
        Notification::Urgent { tasks } => render_list("🚨 Urgent deadlines", tasks, 0, settings),
        Notification::Regular { tasks, remainder } => {
            render_list("📅 Deadline reminder", tasks, *remainder, settings)
        }
    }
}

fn render_list(header: &str, tasks: &[Scored], remainder: usize, settings: &DisplaySettings) -> String {
    let mut out = String::new();
    out.push_str(header);
    out.push_str("\n\n");

    for scored in tasks {
        out.push_str(&render_task(scored, settings));
        out.push('\n');
    }

    if remainder > 0 {
        out.push_str(&format!("…and {} more\n", remainder));
    }

    out
}

fn render_task(scored: &Scored, settings: &DisplaySettings) -> String {
    let task = &scored.deadline;
    let mut out = String::new();

    if settings.show_emojis {
        out.push_str(weight_glyph(task.weight));
        out.push(' ');
    }
    out.push_str(&task.title);
    if settings.show_weight {
        out.push_str(&format!(" [w{}]", task.weight));
    }
    out.push('\n');

    if settings.show_remaining_time {
        let remaining = Duration::milliseconds((scored.hours_until * 3_600_000.0) as i64);
        out.push_str(&format!("⏳ {}\n", format_remaining(remaining)));
    }
    if settings.show_date {
        out.push_str(&format!("📅 {}\n", task.due_at.format("%d.%m.%Y %H:%M")));
    }
    if settings.show_importance {
        out.push_str(&format!("{}\n", Severity::from_score(scored.score).label()));
    }
    if settings.show_description {
        if let Some(desc) = &task.description {
            out.push_str(&format!("📄 {}\n", desc));
        }
    }

    out
}

/// Human-readable remaining time ("overdue", "45m", "3h 20m", "2d 4h", "3w 2d")
pub fn format_remaining(remaining: Duration) -> String {
    if remaining < Duration::zero() {
        return "overdue".to_string();
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    if days >= 7 {
        let weeks = days / 7;
        let rem_days = days % 7;
        if rem_days > 0 {
            format!("{}w {}d", weeks, rem_days)
        } else {
            format!("{}w", weeks)
        }
    } else if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::domain::{Deadline, Weight};
    use crate::importance;

    fn scored(weight: u8, hours_until: f64, description: Option<&str>) -> Scored {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
            .unwrap()
            .with_timezone(&chrono_tz::UTC);
        let due_at = now + Duration::milliseconds((hours_until * 3_600_000.0) as i64);
        let weight = Weight::new(weight).unwrap();
        Scored {
            deadline: Deadline {
                id: 1,
                user_id: 1,
                title: "Hand in report".to_string(),
                description: description.map(String::from),
                due_at,
                weight,
                created_at: now,
                completed: false,
                completed_at: None,
            },
            score: importance::score_from_hours(weight, hours_until),
            hours_until,
        }
    }

    #[test]
    fn test_urgent_message_layout() {
        let notification = Notification::Urgent {
            tasks: vec![scored(10, 0.5, Some("final version"))],
        };
        let text = render(&notification, &DisplaySettings::default());

        assert!(text.starts_with("🚨 Urgent deadlines\n\n"));
        assert!(text.contains("🔴 Hand in report [w10]"));
        assert!(text.contains("⏳ 30m"));
        assert!(text.contains("📅 10.03.2026 12:30"));
        assert!(text.contains("🔥 Critical"));
        assert!(text.contains("📄 final version"));
    }

    #[test]
    fn test_regular_message_shows_remainder() {
        let notification = Notification::Regular {
            tasks: vec![scored(2, 20.0, None)],
            remainder: 4,
        };
        let text = render(&notification, &DisplaySettings::default());

        assert!(text.starts_with("📅 Deadline reminder\n\n"));
        assert!(text.contains("…and 4 more"));
    }

    #[test]
    fn test_display_settings_suppress_lines() {
        let settings = DisplaySettings {
            show_remaining_time: false,
            show_description: false,
            show_importance: false,
            show_weight: false,
            show_emojis: false,
            show_date: false,
        };
        let notification = Notification::Urgent {
            tasks: vec![scored(10, 0.5, Some("hidden"))],
        };
        let text = render(&notification, &settings);

        assert!(text.contains("Hand in report\n"));
        assert!(!text.contains("[w10]"));
        assert!(!text.contains("⏳"));
        assert!(!text.contains("📅 10.03"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("🔴"));
    }

    #[test]
    fn test_overdue_remaining_label() {
        let notification = Notification::Urgent {
            tasks: vec![scored(3, -2.0, None)],
        };
        let text = render(&notification, &DisplaySettings::default());
        assert!(text.contains("⏳ overdue"));
    }

    #[test]
    fn test_format_remaining_buckets() {
        assert_eq!(format_remaining(Duration::minutes(-1)), "overdue");
        assert_eq!(format_remaining(Duration::minutes(45)), "45m");
        assert_eq!(format_remaining(Duration::minutes(200)), "3h 20m");
        assert_eq!(format_remaining(Duration::hours(52)), "2d 4h");
        assert_eq!(format_remaining(Duration::days(23)), "3w 2d");
        assert_eq!(format_remaining(Duration::days(14)), "2w");
    }
}

