//! Owner-facing monthly figures for one space.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::availability::peak_usage;
use crate::dates::DateRange;
use crate::live::LivePolicy;
use crate::pricing::compute_total_price;
use crate::reservation::{Reservation, ReservationStatus};
use crate::space::Space;
use crate::tier::TierCounts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceStats {
    /// `YYYY-MM` of the reporting month.
    pub month: String,
    /// Reservations starting this month, in any status.
    pub reservations_this_month: usize,
    pub pending: usize,
    /// Value of the approved reservations starting this month.
    pub income_this_month: Decimal,
    /// Items committed on `today` by non-rejected reservations.
    pub occupied_today: TierCounts,
}

/// Figures for the calendar month containing `today`.
pub fn space_stats(space: &Space, reservations: &[Reservation], today: NaiveDate) -> SpaceStats {
    let this_month: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.start_date.year() == today.year() && r.start_date.month() == today.month())
        .collect();

    let income_this_month = this_month
        .iter()
        .filter(|r| r.status == ReservationStatus::Approved)
        .map(|r| compute_total_price(&space.prices, r.quantity, r.range()))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    let live = LivePolicy::non_rejected().select(reservations);

    SpaceStats {
        month: today.format("%Y-%m").to_string(),
        reservations_this_month: this_month.len(),
        pending: reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Pending)
            .count(),
        income_this_month,
        occupied_today: peak_usage(&live, DateRange::single(today)),
    }
}
