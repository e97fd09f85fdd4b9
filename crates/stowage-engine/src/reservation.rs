//! Reservations, their approval lifecycle and the hold-then-capture payment
//! sub-state.
//!
//! ```text
//! status:   pending --approve--> approved
//!           pending --reject---> rejected
//! payment:  pending_approval --hold--> requires_capture --capture--> paid
//! ```
//!
//! `approved` and `rejected` are terminal. Capture is only allowed once the
//! owner approved. Capacity checks never look at the payment state.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::Occupancy;
use crate::dates::DateRange;
use crate::error::{Result, StowageError};
use crate::ids::{ReservationId, SpaceId, UserId};
use crate::space::Space;
use crate::tier::TierCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No funds held yet.
    #[default]
    PendingApproval,
    /// Funds held by the payment provider, waiting for capture.
    RequiresCapture,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::PendingApproval => "pending_approval",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owner's answer to a pending reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target(self) -> ReservationStatus {
        match self {
            Decision::Approve => ReservationStatus::Approved,
            Decision::Reject => ReservationStatus::Rejected,
        }
    }
}

/// A booking of one space by one renter for one inclusive date range.
///
/// Deserializing rejects `end_date < start_date`: a stored inverted range
/// would overlap no day and silently free its capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReservation")]
pub struct Reservation {
    pub id: ReservationId,
    pub renter_id: UserId,
    pub space_id: SpaceId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: TierCounts,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// One verification photo reference per requested item unit.
    #[serde(default)]
    pub item_photos: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawReservation {
    id: ReservationId,
    renter_id: UserId,
    space_id: SpaceId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    quantity: TierCounts,
    #[serde(default)]
    status: ReservationStatus,
    #[serde(default)]
    payment_status: PaymentStatus,
    #[serde(default)]
    item_photos: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RawReservation> for Reservation {
    type Error = StowageError;

    fn try_from(raw: RawReservation) -> Result<Self> {
        DateRange::checked(raw.start_date, raw.end_date)?;
        Ok(Self {
            id: raw.id,
            renter_id: raw.renter_id,
            space_id: raw.space_id,
            start_date: raw.start_date,
            end_date: raw.end_date,
            quantity: raw.quantity,
            status: raw.status,
            payment_status: raw.payment_status,
            item_photos: raw.item_photos,
            created_at: raw.created_at,
        })
    }
}

impl Reservation {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Apply the owner's decision.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidTransition` unless the reservation is pending.
    pub fn decide(&mut self, decision: Decision) -> Result<()> {
        let target = decision.target();
        if self.status != ReservationStatus::Pending {
            return Err(StowageError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Record that the payment provider placed a hold on the renter's funds.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidTransition` if the reservation was rejected
    /// or a hold was already recorded.
    pub fn record_hold(&mut self) -> Result<()> {
        if self.status == ReservationStatus::Rejected
            || self.payment_status != PaymentStatus::PendingApproval
        {
            return Err(self.payment_transition_error(PaymentStatus::RequiresCapture));
        }
        self.payment_status = PaymentStatus::RequiresCapture;
        Ok(())
    }

    /// Capture held funds after approval.
    ///
    /// # Errors
    /// Returns `StowageError::InvalidTransition` unless the reservation is
    /// approved with a hold in place.
    pub fn capture(&mut self) -> Result<()> {
        if self.status != ReservationStatus::Approved
            || self.payment_status != PaymentStatus::RequiresCapture
        {
            return Err(self.payment_transition_error(PaymentStatus::Paid));
        }
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    fn payment_transition_error(&self, to: PaymentStatus) -> StowageError {
        StowageError::InvalidTransition {
            from: format!("{}/{}", self.status, self.payment_status),
            to: to.to_string(),
        }
    }
}

impl Occupancy for Reservation {
    fn occupied_range(&self) -> DateRange {
        self.range()
    }

    fn occupied_quantity(&self) -> TierCounts {
        self.quantity
    }
}

/// What a renter submits when booking a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub renter_id: UserId,
    pub space_id: SpaceId,
    pub range: DateRange,
    pub quantity: TierCounts,
    #[serde(default)]
    pub item_photos: Vec<String>,
}

impl ReservationRequest {
    /// Check the request against the target space, capacity aside.
    ///
    /// Photos are optional, but when present there must be exactly one per
    /// requested item unit.
    ///
    /// # Errors
    /// - `InvalidInput` for an inverted range or a space mismatch
    /// - `EmptyRequest` when no item is requested
    /// - `MinimumStay` when the stay is shorter than the space allows
    /// - `PhotoCountMismatch` when the photo count does not match the units
    pub fn validate_for(&self, space: &Space) -> Result<()> {
        if self.space_id != space.id {
            return Err(StowageError::InvalidInput(format!(
                "request targets space {}, not {}",
                self.space_id, space.id
            )));
        }
        if self.range.is_inverted() {
            return Err(StowageError::InvalidInput(format!(
                "range start {} is after end {}",
                self.range.start, self.range.end
            )));
        }
        if self.quantity.is_zero() {
            return Err(StowageError::EmptyRequest);
        }
        space.check_min_stay(self.range)?;

        let expected = self.quantity.total();
        if !self.item_photos.is_empty() && self.item_photos.len() as u64 != expected {
            return Err(StowageError::PhotoCountMismatch {
                expected,
                actual: self.item_photos.len(),
            });
        }
        Ok(())
    }

    /// Turn the request into a fresh pending reservation.
    pub fn into_reservation(self, created_at: DateTime<Utc>) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            renter_id: self.renter_id,
            space_id: self.space_id,
            start_date: self.range.start,
            end_date: self.range.end,
            quantity: self.quantity,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::PendingApproval,
            item_photos: self.item_photos,
            created_at,
        }
    }
}
