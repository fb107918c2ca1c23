//! Per-user notification and display preferences

use std::collections::BTreeSet;

use thiserror::Error;

/// Error parsing a [`ClockTime`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time {0:?}, expected HH:MM")]
pub struct ClockTimeError(pub String);

/// A minute-exact 24h wall-clock time ("HH:MM").
///
/// Eligibility matching is exact equality against the current tick's
/// minute; there is no tolerance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a clock time, rejecting out-of-range components
    pub fn new(hour: u8, minute: u8) -> Result<Self, ClockTimeError> {
        if hour > 23 || minute > 59 {
            return Err(ClockTimeError(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::str::FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockTimeError(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(err)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u8 = h.parse().map_err(|_| err())?;
        let minute: u8 = m.parse().map_err(|_| err())?;
        Self::new(hour, minute).map_err(|_| err())
    }
}

/// When a user wants to be notified.
///
/// Defaults to no times (silent) on all seven weekdays. Sets make
/// duplicate entries impossible, so eligibility is inherently boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPreferences {
    /// Minute-exact notification times
    pub times: BTreeSet<ClockTime>,
    /// Allowed weekdays, 0 = Monday .. 6 = Sunday
    pub weekdays: BTreeSet<u8>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            times: BTreeSet::new(),
            weekdays: (0..7).collect(),
        }
    }
}

impl NotificationPreferences {
    /// Whether a tick at the given local minute and weekday should notify
    pub fn is_eligible(&self, minute: ClockTime, weekday: u8) -> bool {
        self.times.contains(&minute) && self.weekdays.contains(&weekday)
    }
}

/// Which parts of a notification a user wants rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub show_remaining_time: bool,
    pub show_description: bool,
    pub show_importance: bool,
    pub show_weight: bool,
    pub show_emojis: bool,
    pub show_date: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_remaining_time: true,
            show_description: true,
            show_importance: true,
            show_weight: true,
            show_emojis: true,
            show_date: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time_parse() {
        let t: ClockTime = "10:00".parse().unwrap();
        assert_eq!(t.hour(), 10);
        assert_eq!(t.minute(), 0);
        assert_eq!(t.to_string(), "10:00");

        let t: ClockTime = "23:59".parse().unwrap();
        assert_eq!(t.to_string(), "23:59");
    }

    #[test]
    fn test_clock_time_rejects_malformed() {
        for bad in ["24:00", "10:60", "1:00", "10:0", "10", "10-00", "aa:bb", ""] {
            assert!(bad.parse::<ClockTime>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_default_preferences_are_silent() {
        let prefs = NotificationPreferences::default();
        let ten = "10:00".parse().unwrap();
        for weekday in 0..7 {
            assert!(!prefs.is_eligible(ten, weekday));
        }
    }

    #[test]
    fn test_eligibility_requires_both_time_and_weekday() {
        let mut prefs = NotificationPreferences::default();
        prefs.times.insert("20:00".parse().unwrap());
        prefs.weekdays = (0..5).collect(); // Mon-Fri

        let eight_pm = "20:00".parse().unwrap();
        let eight_oh_one: ClockTime = "20:01".parse().unwrap();

        assert!(prefs.is_eligible(eight_pm, 0)); // Monday
        assert!(prefs.is_eligible(eight_pm, 4)); // Friday
        assert!(!prefs.is_eligible(eight_pm, 5)); // Saturday
        assert!(!prefs.is_eligible(eight_oh_one, 0)); // wrong minute
    }

    #[test]
    fn test_duplicate_times_collapse() {
        let mut prefs = NotificationPreferences::default();
        let t: ClockTime = "09:30".parse().unwrap();
        prefs.times.insert(t);
        prefs.times.insert(t);
        assert_eq!(prefs.times.len(), 1);
    }
}
