//! Error types for stowage-engine operations.

use thiserror::Error;

use crate::ids::{ReservationId, SpaceId};
use crate::tier::Tier;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StowageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Space not found: {0}")]
    SpaceNotFound(SpaceId),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Minimum stay is {required} days, requested {requested}")]
    MinimumStay { required: u32, requested: u64 },

    #[error("Reservation must include at least one item")]
    EmptyRequest,

    #[error("Expected {expected} item photos, got {actual}")]
    PhotoCountMismatch { expected: u64, actual: usize },

    #[error("Not enough {tier} capacity: requested {requested}, remaining {remaining}")]
    CapacityExceeded {
        tier: Tier,
        requested: u32,
        remaining: u32,
    },

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, StowageError>;
