//! Price of a prospective reservation.
//!
//! `total = Σ_tier (quantity * unit_price) * inclusive_days`. No rounding is
//! applied; currency formatting is left to the presentation layer.
//!
//! Unlike the availability engine, an inverted range is not clamped: the day
//! count comes from the absolute difference between the dates, so an inverted
//! range is priced like its mirror image.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::dates::{days_between_inclusive, DateRange};
use crate::error::{Result, StowageError};
use crate::tier::{Tier, TierCounts, TierPrices};

/// Breakdown of a price estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub days: u64,
    pub daily_total: Decimal,
    pub total: Decimal,
}

/// Price of the requested items for a single day.
pub fn daily_total(unit_prices: &TierPrices, requested: TierCounts) -> Decimal {
    Tier::ALL.into_iter().fold(Decimal::ZERO, |acc, tier| {
        let line = unit_prices
            .get(tier)
            .saturating_mul(Decimal::from(requested.get(tier)));
        acc.saturating_add(line)
    })
}

/// Total price of `requested` items over `range`.
pub fn compute_total_price(
    unit_prices: &TierPrices,
    requested: TierCounts,
    range: DateRange,
) -> Decimal {
    quote(unit_prices, requested, range).total
}

/// Day count, daily total and total for `requested` items over `range`.
pub fn quote(unit_prices: &TierPrices, requested: TierCounts, range: DateRange) -> Quote {
    let days = days_between_inclusive(range.start, range.end);
    let daily_total = daily_total(unit_prices, requested);
    Quote {
        days,
        daily_total,
        total: daily_total.saturating_mul(Decimal::from(days)),
    }
}

/// Convert an amount to integer minor units (cents) for a payment hold,
/// rounding half away from zero.
///
/// # Errors
/// Returns `StowageError::InvalidInput` for a negative amount or one that does
/// not fit in an `i64` once expressed in cents.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(StowageError::InvalidInput(format!(
            "amount must be non-negative, got {amount}"
        )));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| StowageError::InvalidInput(format!("amount {amount} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn fractional_prices_keep_their_precision() {
        let prices = TierPrices::new(dec("1.25"), dec("0"), dec("0")).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-01-02").unwrap();
        let q = quote(&prices, TierCounts::new(3, 0, 0), range);
        assert_eq!(q.daily_total, dec("3.75"));
        assert_eq!(q.total, dec("7.50"));
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("66")).unwrap(), 6600);
        assert_eq!(to_minor_units(dec("10.005")).unwrap(), 1001);
        assert_eq!(to_minor_units(dec("10.004")).unwrap(), 1000);
        assert!(to_minor_units(dec("-1")).is_err());
    }
}
