//! # stowage-engine
//!
//! Date-range capacity and pricing engine for a tiered storage-space rental
//! marketplace.
//!
//! Hosts list spaces that hold a fixed number of small, medium and large items
//! at once. Renters ask for some items over an inclusive range of calendar
//! days. The engine answers one question deterministically: how many more
//! items of each tier fit on the busiest day of that range, given the
//! reservations already made. Search, booking pickers, the server-side
//! booking check and the browser bindings all go through the same functions.
//!
//! ## Modules
//!
//! - [`availability`]: peak concurrent usage and remaining capacity
//! - [`pricing`]: inclusive-day price estimates
//! - [`dates`]: inclusive date ranges and calendar-day iteration
//! - [`tier`]: tiers and per-tier quantity/price vectors
//! - [`live`]: which reservations count against capacity
//! - [`search`]: filter spaces by requested items and range
//! - [`space`], [`reservation`]: listings and the booking lifecycle
//! - [`classify`]: item description → tier counts seam
//! - [`repository`]: persistence seams and an in-memory store
//! - [`marketplace`]: the operations composed over the repositories
//! - [`stats`]: owner-facing monthly figures
//! - [`error`]: Error types

pub mod availability;
pub mod classify;
pub mod dates;
pub mod error;
pub mod ids;
pub mod live;
pub mod marketplace;
pub mod pricing;
pub mod repository;
pub mod reservation;
pub mod search;
pub mod space;
pub mod stats;
pub mod tier;

pub use availability::{
    can_accommodate, compute_remaining_capacity, daily_usage, peak_usage, Commitment,
    DailyUsage, Occupancy,
};
pub use classify::{parse_classifier_reply, ItemClassifier};
pub use dates::{days_between_inclusive, enumerate_days, overlaps, DateRange};
pub use error::StowageError;
pub use ids::{ReservationId, SpaceId, UserId};
pub use live::LivePolicy;
pub use marketplace::Marketplace;
pub use pricing::{compute_total_price, quote, Quote};
pub use repository::{InMemoryStore, MarketSnapshot, ReservationRepository, SpaceRepository};
pub use reservation::{Decision, PaymentStatus, Reservation, ReservationRequest, ReservationStatus};
pub use search::{filter_available, fit, Fit, SearchHit, SearchQuery};
pub use space::{Location, PayoutDetails, Space};
pub use tier::{Tier, TierCounts, TierPrices};
