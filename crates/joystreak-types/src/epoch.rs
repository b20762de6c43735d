//! The calendar-day unit used for all day-boundary logic.
//!
//! [`EpochDay`] is a discrete, totally ordered day counter: the number of
//! days since 1970-01-01 in some local calendar. Two timestamps map to
//! the same `EpochDay` iff they fall in the same local calendar day
//! under the configured time zone (resolution happens in the engine's
//! clock module -- this type is zone-agnostic).
//!
//! Streak continuity only ever asks two questions of this type: equality
//! and adjacency, so `next()` is well-defined and checked.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single calendar day, counted from the Unix epoch (1970-01-01 = 0).
///
/// Days before the epoch are negative. The counter saturates at the
/// `i64` range, which is unreachable for any real calendar date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EpochDay(i64);

impl EpochDay {
    /// Wrap a raw day count.
    pub const fn new(days: i64) -> Self {
        Self(days)
    }

    /// Construct from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        // NaiveDate::default() is 1970-01-01, the epoch.
        Self(date.signed_duration_since(NaiveDate::default()).num_days())
    }

    /// Return the raw day count.
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// The day immediately after this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The day immediately before this one.
    pub const fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Whether `self` is exactly the day before `other`.
    ///
    /// This is the streak-continuation test: a qualifying action on
    /// `other` extends a streak whose last credit was on `self`.
    pub const fn is_day_before(self, other: Self) -> bool {
        self.0.saturating_add(1) == other.0
    }
}

impl core::fmt::Display for EpochDay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "day {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_date_is_day_zero() {
        assert_eq!(EpochDay::from_date(NaiveDate::default()).into_inner(), 0);
    }

    #[test]
    fn from_date_counts_days() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 31);
        assert_eq!(date.map(EpochDay::from_date), Some(EpochDay::new(30)));

        let later = NaiveDate::from_ymd_opt(2024, 2, 29);
        // 2024-02-29 is 19,782 days after the epoch.
        assert_eq!(later.map(EpochDay::from_date), Some(EpochDay::new(19_782)));
    }

    #[test]
    fn pre_epoch_dates_are_negative() {
        let date = NaiveDate::from_ymd_opt(1969, 12, 31);
        assert_eq!(date.map(EpochDay::from_date), Some(EpochDay::new(-1)));
    }

    #[test]
    fn adjacency_is_well_defined() {
        let day = EpochDay::new(100);
        assert_eq!(day.next(), EpochDay::new(101));
        assert_eq!(day.prev(), EpochDay::new(99));
        assert!(day.is_day_before(day.next()));
        assert!(!day.is_day_before(day));
        assert!(!day.next().is_day_before(day));
    }

    #[test]
    fn ordering_is_total() {
        assert!(EpochDay::new(1) < EpochDay::new(2));
        assert!(EpochDay::new(-5) < EpochDay::new(0));
    }
}
