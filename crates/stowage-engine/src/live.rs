//! Which reservations count against capacity.
//!
//! The predicate is an explicit value instead of an assumption buried in each
//! query, so every caller states (and tests pin) exactly what it counts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reservation::{Reservation, ReservationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePolicy {
    /// Skip reservations the owner rejected.
    pub exclude_rejected: bool,
    /// Skip reservations that ended before this date.
    pub ended_before: Option<NaiveDate>,
}

impl LivePolicy {
    /// Count everything except rejected reservations.
    pub const fn non_rejected() -> Self {
        Self {
            exclude_rejected: true,
            ended_before: None,
        }
    }

    /// Count non-rejected reservations that end on or after `today`.
    ///
    /// Only suitable for ranges that start on or after `today`: history
    /// before the cutoff is dropped from the overlap check.
    pub const fn upcoming(today: NaiveDate) -> Self {
        Self {
            exclude_rejected: true,
            ended_before: Some(today),
        }
    }

    /// Count every reservation regardless of status or date.
    pub const fn all() -> Self {
        Self {
            exclude_rejected: false,
            ended_before: None,
        }
    }

    pub fn is_live(&self, reservation: &Reservation) -> bool {
        if self.exclude_rejected && reservation.status == ReservationStatus::Rejected {
            return false;
        }
        match self.ended_before {
            Some(cutoff) => reservation.end_date >= cutoff,
            None => true,
        }
    }

    /// The live subset of `reservations`, in input order.
    pub fn select<'a>(&self, reservations: &'a [Reservation]) -> Vec<&'a Reservation> {
        reservations.iter().filter(|r| self.is_live(r)).collect()
    }
}

impl Default for LivePolicy {
    fn default() -> Self {
        Self::non_rejected()
    }
}
