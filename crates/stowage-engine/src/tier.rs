//! Item-size tiers and the per-tier quantity and price vectors.
//!
//! Every space, reservation and search request speaks in terms of three tiers
//! (small, medium, large). [`TierCounts`] holds non-negative integer quantities
//! (capacities, requested items, committed usage); [`TierPrices`] holds the
//! non-negative daily unit price per tier.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StowageError};

/// One of the three item-size categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Boxes, suitcases.
    Small,
    /// Bikes, chairs.
    Medium,
    /// Sofas, wardrobes, pianos.
    Large,
}

impl Tier {
    /// All tiers in ascending size order.
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Medium, Tier::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tier non-negative quantities.
///
/// Missing tiers deserialize as zero, matching how requests omit tiers they
/// do not need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TierCounts {
    #[serde(default)]
    pub small: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub large: u32,
}

impl TierCounts {
    pub const ZERO: TierCounts = TierCounts::new(0, 0, 0);

    pub const fn new(small: u32, medium: u32, large: u32) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    /// Build counts from untrusted signed values.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidInput` if any value is negative or does not
    /// fit in a `u32`.
    pub fn from_signed(small: i64, medium: i64, large: i64) -> Result<Self> {
        let check = |tier: Tier, value: i64| -> Result<u32> {
            if value < 0 {
                return Err(StowageError::InvalidInput(format!(
                    "{tier} quantity must be non-negative, got {value}"
                )));
            }
            u32::try_from(value).map_err(|_| {
                StowageError::InvalidInput(format!("{tier} quantity {value} is too large"))
            })
        };
        Ok(Self::new(
            check(Tier::Small, small)?,
            check(Tier::Medium, medium)?,
            check(Tier::Large, large)?,
        ))
    }

    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.large,
        }
    }

    pub fn set(&mut self, tier: Tier, value: u32) {
        match tier {
            Tier::Small => self.small = value,
            Tier::Medium => self.medium = value,
            Tier::Large => self.large = value,
        }
    }

    /// `(tier, quantity)` pairs in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, u32)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }

    /// Total number of items across all tiers.
    pub fn total(&self) -> u64 {
        u64::from(self.small) + u64::from(self.medium) + u64::from(self.large)
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    pub fn saturating_add(self, other: TierCounts) -> TierCounts {
        self.zip_with(other, u32::saturating_add)
    }

    /// Per-tier `max(0, self - other)`.
    pub fn saturating_sub(self, other: TierCounts) -> TierCounts {
        self.zip_with(other, u32::saturating_sub)
    }

    /// Per-tier maximum.
    pub fn max(self, other: TierCounts) -> TierCounts {
        self.zip_with(other, u32::max)
    }

    /// Per-tier minimum.
    pub fn min(self, other: TierCounts) -> TierCounts {
        self.zip_with(other, u32::min)
    }

    /// True when every tier of `self` is at most the same tier of `available`.
    pub fn fits_within(&self, available: &TierCounts) -> bool {
        self.first_shortfall(available).is_none()
    }

    /// The first tier where `self` asks for more than `available` offers, as
    /// `(tier, requested, available)`.
    pub fn first_shortfall(&self, available: &TierCounts) -> Option<(Tier, u32, u32)> {
        Tier::ALL.into_iter().find_map(|tier| {
            let (wanted, offered) = (self.get(tier), available.get(tier));
            (wanted > offered).then_some((tier, wanted, offered))
        })
    }

    fn zip_with(self, other: TierCounts, f: impl Fn(u32, u32) -> u32) -> TierCounts {
        TierCounts::new(
            f(self.small, other.small),
            f(self.medium, other.medium),
            f(self.large, other.large),
        )
    }
}

impl fmt::Display for TierCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "small={} medium={} large={}",
            self.small, self.medium, self.large
        )
    }
}

/// Per-tier daily unit price. Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTierPrices")]
pub struct TierPrices {
    small: Decimal,
    medium: Decimal,
    large: Decimal,
}

#[derive(Deserialize)]
struct RawTierPrices {
    #[serde(default)]
    small: Decimal,
    #[serde(default)]
    medium: Decimal,
    #[serde(default)]
    large: Decimal,
}

impl TryFrom<RawTierPrices> for TierPrices {
    type Error = StowageError;

    fn try_from(raw: RawTierPrices) -> Result<Self> {
        TierPrices::new(raw.small, raw.medium, raw.large)
    }
}

impl TierPrices {
    /// # Errors
    /// Returns `StowageError::InvalidInput` if any price is negative.
    pub fn new(small: Decimal, medium: Decimal, large: Decimal) -> Result<Self> {
        for (tier, price) in [(Tier::Small, small), (Tier::Medium, medium), (Tier::Large, large)] {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(StowageError::InvalidInput(format!(
                    "{tier} price must be non-negative, got {price}"
                )));
            }
        }
        Ok(Self {
            small,
            medium,
            large,
        })
    }

    /// Whole-unit prices, convenient for listings priced in integer amounts.
    pub fn whole(small: u32, medium: u32, large: u32) -> Self {
        Self {
            small: Decimal::from(small),
            medium: Decimal::from(medium),
            large: Decimal::from(large),
        }
    }

    pub fn get(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Small => self.small,
            Tier::Medium => self.medium,
            Tier::Large => self.large,
        }
    }
}
