//! Storage space listings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::{Result, StowageError};
use crate::ids::{SpaceId, UserId};
use crate::tier::{TierCounts, TierPrices};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Filled in by geocoding, when it succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Where the owner gets paid. Only ever shown to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    pub account_holder: String,
    pub iban: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub owner_id: UserId,
    pub name: String,
    pub location: Location,
    /// Free-form type tag ("garage", "storage room", ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_m2: Option<Decimal>,
    /// Items per tier the space holds at the same time.
    pub capacity: TierCounts,
    /// Daily price per item, per tier.
    pub prices: TierPrices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stay_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<PayoutDetails>,
}

impl Space {
    pub fn new(
        owner_id: UserId,
        name: impl Into<String>,
        location: Location,
        capacity: TierCounts,
        prices: TierPrices,
    ) -> Self {
        Self {
            id: SpaceId::new(),
            owner_id,
            name: name.into(),
            location,
            kind: String::new(),
            area_m2: None,
            capacity,
            prices,
            min_stay_days: None,
            image: None,
            payout: None,
        }
    }

    pub fn with_min_stay(mut self, days: u32) -> Self {
        self.min_stay_days = Some(days);
        self
    }

    pub fn with_payout(mut self, payout: PayoutDetails) -> Self {
        self.payout = Some(payout);
        self
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Check the listing invariants.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidInput` for an empty name or address, a
    /// zero minimum stay, or a negative area.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StowageError::InvalidInput("space name is empty".into()));
        }
        if self.location.address.trim().is_empty() {
            return Err(StowageError::InvalidInput("space address is empty".into()));
        }
        if self.min_stay_days == Some(0) {
            return Err(StowageError::InvalidInput(
                "minimum stay must be at least one day".into(),
            ));
        }
        if let Some(area) = self.area_m2 {
            if area.is_sign_negative() && !area.is_zero() {
                return Err(StowageError::InvalidInput(format!(
                    "area must be non-negative, got {area}"
                )));
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns `StowageError::MinimumStay` when `range` spans fewer days than
    /// the listing's minimum stay.
    pub fn check_min_stay(&self, range: DateRange) -> Result<()> {
        match self.min_stay_days {
            Some(required) if range.day_count() < u64::from(required) => {
                Err(StowageError::MinimumStay {
                    required,
                    requested: range.day_count(),
                })
            }
            _ => Ok(()),
        }
    }

    /// The listing as `viewer` may see it: payout details only for the owner.
    pub fn redacted_for(&self, viewer: Option<UserId>) -> Space {
        let mut space = self.clone();
        if viewer != Some(self.owner_id) {
            space.payout = None;
        }
        space
    }
}
