//! Deadlines and their importance weight

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

/// Identifier of a user (owner of deadlines and notification target)
pub type UserId = i64;

/// Identifier of a deadline
pub type DeadlineId = i64;

/// Error constructing a [`Weight`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightError {
    #[error("weight {0} out of range {min}..={max}", min = Weight::MIN, max = Weight::MAX)]
    OutOfRange(i64),

    #[error("invalid weight: {0:?}")]
    Invalid(String),
}

/// User-assigned base importance, 0..=10.
///
/// Out-of-range values are rejected at construction, never clamped, so
/// data-entry errors surface at the boundary instead of skewing scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(u8);

impl Weight {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;

    /// Create a weight, rejecting values outside 0..=10
    pub fn new(value: u8) -> Result<Self, WeightError> {
        if value > Self::MAX {
            return Err(WeightError::OutOfRange(value as i64));
        }
        Ok(Self(value))
    }

    /// The raw value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Weight {
    type Error = WeightError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Weight {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| WeightError::Invalid(s.to_string()))?;
        if !(Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            return Err(WeightError::OutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

/// A user-owned deadline.
///
/// `due_at` is always timezone-aware by construction; the repository
/// boundary localizes stored timestamps before a `Deadline` exists, so
/// scoring never sees a naive timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Deadline {
    pub id: DeadlineId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Tz>,
    pub weight: Weight,
    pub created_at: DateTime<Tz>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Tz>>,
}
