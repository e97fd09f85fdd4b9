//! Inclusive calendar date ranges and the day arithmetic shared by the
//! availability engine and the pricing calculator.
//!
//! All stepping is by calendar date (`NaiveDate::succ_opt`), never by a fixed
//! 24-hour offset, so daylight-saving transitions cannot skip or repeat a day.

use std::fmt;
use std::iter::FusedIterator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StowageError};

/// Wire format for calendar dates.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// An inclusive `[start, end]` pair of calendar dates.
///
/// A valid range has `start <= end`. The type can still hold an inverted range
/// because callers rely on defined behavior for it: the availability engine
/// reports zero capacity, while pricing counts days by absolute difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Build a range, rejecting `start > end`.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidInput` for an inverted range.
    pub fn checked(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(StowageError::InvalidInput(format!(
                "range start {start} is after end {end}"
            )));
        }
        Ok(Self::new(start, end))
    }

    /// Parse two `YYYY-MM-DD` strings. The resulting range may be inverted.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidDate` if either string is not a calendar date.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Iterate the days of the range, inclusive. Empty when inverted.
    pub fn days(&self) -> Days {
        enumerate_days(self.start, self.end)
    }

    /// Inclusive day span, see [`days_between_inclusive`].
    pub fn day_count(&self) -> u64 {
        days_between_inclusive(self.start, self.end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        overlaps(self, day)
    }

    /// True when at least one day belongs to both ranges.
    pub fn intersects(&self, other: &DateRange) -> bool {
        self.clamp_to(other).is_some()
    }

    /// The days shared by both ranges, if any.
    pub fn clamp_to(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange::new(start, end))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Days {
        self.days()
    }
}

/// Parse a single `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE)
        .map_err(|e| StowageError::InvalidDate(format!("'{s}': {e}")))
}

/// Ordered, finite sequence of calendar days from `start` to `end` inclusive.
///
/// Clone it before consuming (or call [`enumerate_days`] again) to walk the
/// same days twice.
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|day| *day <= self.end)?;
        self.next = current.succ_opt();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(day) if day <= self.end => {
                usize::try_from((self.end - day).num_days() + 1).unwrap_or(usize::MAX)
            }
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Days {}

impl FusedIterator for Days {}

/// Enumerate the calendar days from `start` to `end`, inclusive.
pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> Days {
    Days {
        next: Some(start),
        end,
    }
}

/// True iff `day` falls within `[range.start, range.end]`.
pub fn overlaps(range: &DateRange, day: NaiveDate) -> bool {
    range.start <= day && day <= range.end
}

/// Inclusive day count: `|end - start| + 1`.
///
/// Uses the absolute difference, so an inverted pair still yields a positive
/// count. The availability engine checks for inversion before it gets here.
pub fn days_between_inclusive(start: NaiveDate, end: NaiveDate) -> u64 {
    end.signed_duration_since(start).num_days().unsigned_abs() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn days_iterator_reports_exact_size() {
        let mut days = enumerate_days(d("2024-02-27"), d("2024-03-01"));
        assert_eq!(days.len(), 4);
        days.next();
        assert_eq!(days.len(), 3);
        assert_eq!(days.last(), Some(d("2024-03-01")));
    }

    #[test]
    fn clamp_to_returns_shared_days() {
        let a = DateRange::new(d("2024-01-01"), d("2024-01-10"));
        let b = DateRange::new(d("2024-01-08"), d("2024-01-20"));
        assert_eq!(
            a.clamp_to(&b),
            Some(DateRange::new(d("2024-01-08"), d("2024-01-10")))
        );
        let c = DateRange::new(d("2024-01-11"), d("2024-01-12"));
        assert_eq!(a.clamp_to(&c), None);
    }

    #[test]
    fn range_display_is_inclusive() {
        let r = DateRange::new(d("2024-05-01"), d("2024-05-03"));
        assert_eq!(r.to_string(), "2024-05-01..=2024-05-03");
    }
}
