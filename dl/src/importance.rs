//! Importance scoring for deadlines
//!
//! Pure functions mapping (weight, due time, now) to a ranking score,
//! plus the derived severity label and weight glyph used by the
//! presenter. No side effects, no I/O; identical inputs always produce
//! identical scores.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::domain::Weight;

/// Score floor for overdue deadlines; dominates every future-dated score
pub const OVERDUE_BASE: f64 = 100_000.0;

/// Critical zone: due within 3 days (boundary inclusive)
const CRITICAL_ZONE_HOURS: f64 = 72.0;
const CRITICAL_COEFF: f64 = 2000.0;

/// Attention zone: due within 21 days (boundary inclusive)
const ATTENTION_ZONE_HOURS: f64 = 504.0;
const ATTENTION_COEFF: f64 = 200.0;

/// Planning zone: everything further out
const PLANNING_COEFF: f64 = 5.0;

/// Fractional hours from `now` until `due_at`; negative when overdue
pub fn hours_remaining(due_at: DateTime<Tz>, now: DateTime<Tz>) -> f64 {
    (due_at - now).num_milliseconds() as f64 / 3_600_000.0
}

/// Importance score for a deadline.
///
/// Future-dated scores grow as the remaining time shrinks, scaled by a
/// per-zone coefficient so that a low-weight task due soon can outrank a
/// high-weight task due in weeks without eternally drowning it out.
/// Overdue deadlines score past [`OVERDUE_BASE`] regardless of weight
/// (ties broken by weight), so an overdue weight-0 task stays visible.
pub fn score(weight: Weight, due_at: DateTime<Tz>, now: DateTime<Tz>) -> f64 {
    score_from_hours(weight, hours_remaining(due_at, now))
}

/// Score from an already-computed hours-remaining value
pub fn score_from_hours(weight: Weight, hours_remaining: f64) -> f64 {
    if hours_remaining < 0.0 {
        return OVERDUE_BASE + weight.get() as f64;
    }

    let coeff = if hours_remaining <= CRITICAL_ZONE_HOURS {
        CRITICAL_COEFF
    } else if hours_remaining <= ATTENTION_ZONE_HOURS {
        ATTENTION_COEFF
    } else {
        PLANNING_COEFF
    };

    let effective = hours_remaining.max(0.001);
    weight.get() as f64 * coeff / (effective + 1.0)
}

/// Human-readable severity tier derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    VeryUrgent,
    Urgent,
    Important,
    Normal,
    LowPriority,
}

impl Severity {
    /// Classify a score into a severity tier
    pub fn from_score(score: f64) -> Self {
        if score >= 25.0 {
            Self::Critical
        } else if score >= 15.0 {
            Self::VeryUrgent
        } else if score >= 10.0 {
            Self::Urgent
        } else if score >= 7.0 {
            Self::Important
        } else if score >= 4.0 {
            Self::Normal
        } else {
            Self::LowPriority
        }
    }

    /// Display label with glyph
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "🔥 Critical",
            Self::VeryUrgent => "🚨 Very urgent",
            Self::Urgent => "⚡ Urgent",
            Self::Important => "⏰ Important",
            Self::Normal => "📝 Normal",
            Self::LowPriority => "🔵 Low priority",
        }
    }
}

/// Glyph for a weight value; total over the whole 0..=10 range
pub fn weight_glyph(weight: Weight) -> &'static str {
    match weight.get() {
        9..=10 => "🔴",
        7..=8 => "🟠",
        5..=6 => "🟡",
        3..=4 => "🔵",
        _ => "⚪",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn w(value: u8) -> Weight {
        Weight::new(value).unwrap()
    }

    fn now() -> DateTime<Tz> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
            .unwrap()
            .with_timezone(&chrono_tz::UTC)
    }

    #[test]
    fn test_scenario_urgent_half_hour() {
        // weight 10 due in 30 minutes: critical zone, 10 * 2000 / 1.5
        let score = score(w(10), now() + Duration::minutes(30), now());
        assert!((score - 13_333.333).abs() < 0.01, "got {}", score);
    }

    #[test]
    fn test_scenario_attention_zone() {
        // weight 5 due in 240h: 5 * 200 / 241 ≈ 4.15
        let score = score(w(5), now() + Duration::hours(240), now());
        assert!((score - 4.149).abs() < 0.001, "got {}", score);
    }

    #[test]
    fn test_scenario_overdue() {
        let score = score(w(3), now() - Duration::hours(2), now());
        assert_eq!(score, 100_003.0);
    }

    #[test]
    fn test_zone_boundaries_inclusive_on_tighter_side() {
        // Exactly 72h uses the critical coefficient
        let at_72 = score_from_hours(w(5), 72.0);
        assert!((at_72 - 5.0 * 2000.0 / 73.0).abs() < 1e-9);

        // A second past 72h uses the attention coefficient
        let past_72 = score(w(5), now() + Duration::hours(72) + Duration::seconds(1), now());
        let expected_coeff_drop = 5.0 * 200.0;
        assert!(past_72 < expected_coeff_drop, "got {}", past_72);
        assert!(past_72 > 13.0 && past_72 < 14.0, "got {}", past_72);

        // Same at the 504h boundary
        let at_504 = score_from_hours(w(5), 504.0);
        assert!((at_504 - 5.0 * 200.0 / 505.0).abs() < 1e-9);
        let past_504 = score_from_hours(w(5), 504.001);
        assert!(past_504 < at_504 / 10.0);
    }

    #[test]
    fn test_weight_zero_scores_zero_in_future() {
        for hours in [0.5, 72.0, 100.0, 504.0, 1000.0] {
            assert_eq!(score_from_hours(w(0), hours), 0.0);
        }
    }

    #[test]
    fn test_weight_zero_overdue_still_visible() {
        // Overdue visibility does not depend on weight
        assert_eq!(score_from_hours(w(0), -1.0), OVERDUE_BASE);
    }

    #[test]
    fn test_determinism() {
        let due = now() + Duration::minutes(1234);
        let a = score(w(7), due, now());
        let b = score(w(7), due, now());
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_score(25.0), Severity::Critical);
        assert_eq!(Severity::from_score(24.9), Severity::VeryUrgent);
        assert_eq!(Severity::from_score(15.0), Severity::VeryUrgent);
        assert_eq!(Severity::from_score(10.0), Severity::Urgent);
        assert_eq!(Severity::from_score(7.0), Severity::Important);
        assert_eq!(Severity::from_score(4.0), Severity::Normal);
        assert_eq!(Severity::from_score(3.9), Severity::LowPriority);
    }

    #[test]
    fn test_weight_glyph_total() {
        for v in 0..=10u8 {
            assert!(!weight_glyph(w(v)).is_empty());
        }
        assert_eq!(weight_glyph(w(10)), "🔴");
        assert_eq!(weight_glyph(w(9)), "🔴");
        assert_eq!(weight_glyph(w(7)), "🟠");
        assert_eq!(weight_glyph(w(5)), "🟡");
        assert_eq!(weight_glyph(w(3)), "🔵");
        assert_eq!(weight_glyph(w(0)), "⚪");
    }

    proptest! {
        /// Within a zone, less remaining time strictly raises the score.
        /// Inputs stay above the near-zero clamp, where scores plateau.
        #[test]
        fn prop_strictly_monotone_within_critical_zone(
            weight in 1u8..=10,
            h1 in 0.001f64..=72.0,
            h2 in 0.001f64..=72.0,
        ) {
            prop_assume!((h1 - h2).abs() > 1e-9);
            let (closer, further) = if h1 < h2 { (h1, h2) } else { (h2, h1) };
            prop_assert!(score_from_hours(w(weight), closer) > score_from_hours(w(weight), further));
        }

        /// Any overdue deadline outranks any future-dated one
        #[test]
        fn prop_overdue_dominates(
            w_over in 0u8..=10,
            w_future in 0u8..=10,
            overdue_hours in -10_000.0f64..-0.001,
            future_hours in 0.0f64..10_000.0,
        ) {
            prop_assert!(
                score_from_hours(w(w_over), overdue_hours) > score_from_hours(w(w_future), future_hours)
            );
        }

        /// Scores never go negative
        #[test]
        fn prop_score_non_negative(weight in 0u8..=10, hours in -10_000.0f64..10_000.0) {
            prop_assert!(score_from_hours(w(weight), hours) >= 0.0);
        }
    }
}
