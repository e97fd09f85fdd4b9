//! Remaining-capacity computation over date ranges.
//!
//! A space's per-tier capacity is a *simultaneous* limit: a space holding three
//! medium items can hold three on every single day, not three across a stay.
//! A candidate range may overlap several existing reservations on different
//! subsets of its days, so the binding constraint is the single busiest day
//! inside the range, not the sum of every overlapping reservation.
//!
//! Which reservations count (rejected ones, past ones) is decided by the caller,
//! see [`LivePolicy`](crate::live::LivePolicy).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{overlaps, DateRange};
use crate::tier::{Tier, TierCounts};

/// Anything that occupies per-tier capacity over an inclusive date range.
pub trait Occupancy {
    fn occupied_range(&self) -> DateRange;
    fn occupied_quantity(&self) -> TierCounts;
}

impl<T: Occupancy + ?Sized> Occupancy for &T {
    fn occupied_range(&self) -> DateRange {
        (**self).occupied_range()
    }

    fn occupied_quantity(&self) -> TierCounts {
        (**self).occupied_quantity()
    }
}

/// A bare committed quantity over a date range, detached from any reservation
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub range: DateRange,
    pub quantity: TierCounts,
}

impl Commitment {
    pub fn new(range: DateRange, quantity: TierCounts) -> Self {
        Self { range, quantity }
    }
}

impl Occupancy for Commitment {
    fn occupied_range(&self) -> DateRange {
        self.range
    }

    fn occupied_quantity(&self) -> TierCounts {
        self.quantity
    }
}

/// Committed quantity on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub used: TierCounts,
}

/// Remaining bookable quantity per tier for `range`.
///
/// For every day in `range`, sums the quantities of the reservations active on
/// that day (inclusive on both ends), takes the per-tier maximum across the
/// days, and subtracts it from `capacity`, flooring at zero.
///
/// An inverted range (`start > end`) yields zero on every tier.
///
/// The result is always between zero and `capacity`, tier by tier.
pub fn compute_remaining_capacity<O: Occupancy>(
    capacity: TierCounts,
    reservations: &[O],
    range: DateRange,
) -> TierCounts {
    if range.is_inverted() {
        return TierCounts::ZERO;
    }
    capacity.saturating_sub(peak_usage(reservations, range))
}

/// True when `requested` fits in the remaining capacity for `range`.
pub fn can_accommodate<O: Occupancy>(
    capacity: TierCounts,
    reservations: &[O],
    range: DateRange,
    requested: TierCounts,
) -> bool {
    requested.fits_within(&compute_remaining_capacity(capacity, reservations, range))
}

/// Highest single-day committed quantity per tier within `range`.
///
/// Sweep line over reservation boundaries clipped to the range: each clipped
/// reservation adds its quantity on its first day and removes it the day after
/// its last. Cost depends on the number of reservations, not on the length of
/// the range. Zero for an inverted range.
pub fn peak_usage<O: Occupancy>(reservations: &[O], range: DateRange) -> TierCounts {
    if range.is_inverted() {
        return TierCounts::ZERO;
    }

    let mut boundaries: Vec<(NaiveDate, Boundary, TierCounts)> =
        Vec::with_capacity(reservations.len() * 2);
    for reservation in reservations {
        let Some(clipped) = reservation.occupied_range().clamp_to(&range) else {
            continue;
        };
        let quantity = reservation.occupied_quantity();
        if quantity.is_zero() {
            continue;
        }
        boundaries.push((clipped.start, Boundary::Enter, quantity));
        // Reservations running through NaiveDate::MAX never leave.
        if let Some(after) = clipped.end.succ_opt() {
            boundaries.push((after, Boundary::Leave, quantity));
        }
    }

    // Leaves sort before enters on the same day, so the running total never
    // overshoots the true usage of that day.
    boundaries.sort_by_key(|&(day, boundary, _)| (day, boundary));

    let mut running = [0u64; 3];
    let mut peak = [0u64; 3];
    for (_, boundary, quantity) in &boundaries {
        for (slot, tier) in Tier::ALL.into_iter().enumerate() {
            let amount = u64::from(quantity.get(tier));
            match boundary {
                Boundary::Enter => {
                    running[slot] += amount;
                    peak[slot] = peak[slot].max(running[slot]);
                }
                Boundary::Leave => running[slot] -= amount,
            }
        }
    }

    let clamp = |value: u64| u32::try_from(value).unwrap_or(u32::MAX);
    TierCounts::new(clamp(peak[0]), clamp(peak[1]), clamp(peak[2]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Leave,
    Enter,
}

/// Committed quantity on each day of `range`, in date order.
///
/// Empty for an inverted range.
pub fn daily_usage<O: Occupancy>(reservations: &[O], range: DateRange) -> Vec<DailyUsage> {
    let active: Vec<&O> = reservations
        .iter()
        .filter(|r| r.occupied_range().intersects(&range))
        .collect();

    range
        .days()
        .map(|date| {
            let used = active
                .iter()
                .filter(|r| overlaps(&r.occupied_range(), date))
                .fold(TierCounts::ZERO, |acc, r| {
                    acc.saturating_add(r.occupied_quantity())
                });
            DailyUsage { date, used }
        })
        .collect()
}
