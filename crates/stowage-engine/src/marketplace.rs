//! Marketplace operations: the availability engine and pricing calculator
//! composed with the space/reservation repositories.
//!
//! Every operation takes the acting user explicitly; there is no ambient
//! session. Reservation creation holds a per-space lock across reading the
//! space, the capacity check and the insert, so two bookings racing for the
//! same space inside one process cannot both pass the check. Space edits and
//! deletes take the same lock. Stores shared between processes still need
//! their own constraint at write time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::availability::{compute_remaining_capacity, daily_usage, DailyUsage};
use crate::classify::ItemClassifier;
use crate::dates::DateRange;
use crate::error::{Result, StowageError};
use crate::ids::{ReservationId, SpaceId, UserId};
use crate::live::LivePolicy;
use crate::pricing::{quote, Quote};
use crate::repository::{InMemoryStore, ReservationRepository, SpaceRepository};
use crate::reservation::{Decision, Reservation, ReservationRequest};
use crate::search::{filter_available, SearchHit, SearchQuery};
use crate::space::Space;
use crate::stats::{space_stats, SpaceStats};
use crate::tier::TierCounts;

pub struct Marketplace<S, R> {
    spaces: Arc<S>,
    reservations: Arc<R>,
    policy: LivePolicy,
    booking_locks: Mutex<HashMap<SpaceId, Arc<Mutex<()>>>>,
}

impl Marketplace<InMemoryStore, InMemoryStore> {
    /// A marketplace whose spaces and reservations live in one in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self::new(Arc::clone(&store), store)
    }
}

impl<S: SpaceRepository, R: ReservationRepository> Marketplace<S, R> {
    pub fn new(spaces: Arc<S>, reservations: Arc<R>) -> Self {
        Self {
            spaces,
            reservations,
            policy: LivePolicy::default(),
            booking_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the predicate deciding which reservations count against capacity.
    pub fn with_policy(mut self, policy: LivePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LivePolicy {
        self.policy
    }

    // ── Spaces ───────────────────────────────────────────────────────────

    /// List a new space for its owner.
    pub fn add_space(&self, space: Space) -> Result<SpaceId> {
        space.validate()?;
        let id = space.id;
        self.spaces.insert_space(space)?;
        info!(space_id = %id, "space listed");
        Ok(id)
    }

    /// Replace a listing. Only its owner may edit it, and ownership cannot move.
    pub fn update_space(&self, owner: UserId, space: Space) -> Result<()> {
        self.owned_space(owner, space.id)?;
        let lock = self.booking_lock(space.id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StowageError::Repository("booking lock poisoned".into()))?;

        let current = self.owned_space(owner, space.id)?;
        if space.owner_id != current.owner_id {
            return Err(StowageError::Unauthorized(
                "space ownership cannot be transferred".into(),
            ));
        }
        space.validate()?;
        let id = space.id;
        if !self.spaces.update_space(space)? {
            return Err(StowageError::SpaceNotFound(id));
        }
        info!(space_id = %id, "space updated");
        Ok(())
    }

    /// Remove a listing. Its reservations are kept as-is.
    pub fn delete_space(&self, owner: UserId, id: SpaceId) -> Result<()> {
        self.owned_space(owner, id)?;
        let lock = self.booking_lock(id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StowageError::Repository("booking lock poisoned".into()))?;

        self.spaces.delete_space(id)?;
        self.forget_booking_lock(id)?;
        info!(space_id = %id, "space deleted");
        Ok(())
    }

    /// A space as `viewer` may see it; payout details are owner-only.
    pub fn space_view(&self, viewer: Option<UserId>, id: SpaceId) -> Result<Space> {
        Ok(self.require_space(id)?.redacted_for(viewer))
    }

    pub fn owner_spaces(&self, owner: UserId) -> Result<Vec<Space>> {
        self.spaces.spaces_by_owner(owner)
    }

    // ── Search and estimates ─────────────────────────────────────────────

    /// Spaces that can take `query.requested` on every day of `query.range`.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let spaces = self.spaces.spaces()?;
        let mut hits = filter_available(&spaces, |space| self.live_reservations(space.id), query)?;
        for hit in &mut hits {
            hit.space.payout = None;
        }
        debug!(
            range = %query.range,
            requested = %query.requested,
            candidates = spaces.len(),
            hits = hits.len(),
            "search evaluated"
        );
        Ok(hits)
    }

    /// Classify a free-text description, then search with the resulting counts.
    pub fn search_by_description<C: ItemClassifier + ?Sized>(
        &self,
        classifier: &C,
        description: &str,
        range: DateRange,
    ) -> Result<Vec<SearchHit>> {
        if description.trim().is_empty() {
            return Err(StowageError::InvalidInput("item description is empty".into()));
        }
        let requested = classifier.classify(description)?;
        debug!(%requested, "description classified");
        self.search(&SearchQuery::new(range, requested))
    }

    /// Remaining capacity of one space, bounding the booking quantity pickers.
    pub fn availability(&self, space_id: SpaceId, range: DateRange) -> Result<TierCounts> {
        let space = self.require_space(space_id)?;
        let live = self.live_reservations(space_id)?;
        Ok(compute_remaining_capacity(space.capacity, &live, range))
    }

    /// Per-day committed quantities of one space.
    pub fn calendar(&self, space_id: SpaceId, range: DateRange) -> Result<Vec<DailyUsage>> {
        self.require_space(space_id)?;
        let live = self.live_reservations(space_id)?;
        Ok(daily_usage(&live, range))
    }

    pub fn quote(&self, space_id: SpaceId, requested: TierCounts, range: DateRange) -> Result<Quote> {
        let space = self.require_space(space_id)?;
        Ok(quote(&space.prices, requested, range))
    }

    // ── Reservations ─────────────────────────────────────────────────────

    /// Validate and store a new pending reservation.
    ///
    /// # Errors
    /// Besides the request validation errors, returns
    /// `StowageError::CapacityExceeded` when some tier lacks room on some day.
    pub fn create_reservation(
        &self,
        request: ReservationRequest,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        self.require_space(request.space_id)?;

        let lock = self.booking_lock(request.space_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StowageError::Repository("booking lock poisoned".into()))?;

        // Read again under the lock: the owner may have edited or deleted it.
        let space = self.require_space(request.space_id)?;
        request.validate_for(&space)?;

        let live = self.live_reservations(space.id)?;
        let remaining = compute_remaining_capacity(space.capacity, &live, request.range);
        if let Some((tier, requested, remaining)) = request.quantity.first_shortfall(&remaining) {
            warn!(
                space_id = %space.id,
                range = %request.range,
                %tier, requested, remaining,
                "reservation refused: not enough capacity"
            );
            return Err(StowageError::CapacityExceeded {
                tier,
                requested,
                remaining,
            });
        }

        let reservation = request.into_reservation(now);
        self.reservations.insert_reservation(reservation.clone())?;
        info!(
            reservation_id = %reservation.id,
            space_id = %space.id,
            range = %reservation.range(),
            quantity = %reservation.quantity,
            "reservation created"
        );
        Ok(reservation)
    }

    /// The space owner approves or rejects a pending reservation.
    pub fn decide_reservation(
        &self,
        owner: UserId,
        id: ReservationId,
        decision: Decision,
    ) -> Result<Reservation> {
        let mut reservation = self.owner_reservation(owner, id)?;
        reservation.decide(decision)?;
        self.store(&reservation)?;
        info!(reservation_id = %id, status = %reservation.status, "reservation decided");
        Ok(reservation)
    }

    /// The renter's funds are now held by the payment provider.
    pub fn record_payment_hold(&self, renter: UserId, id: ReservationId) -> Result<Reservation> {
        let mut reservation = self.renter_reservation(renter, id)?;
        reservation.record_hold()?;
        self.store(&reservation)?;
        info!(reservation_id = %id, "payment hold recorded");
        Ok(reservation)
    }

    /// The owner captures the held funds of an approved reservation.
    pub fn capture_payment(&self, owner: UserId, id: ReservationId) -> Result<Reservation> {
        let mut reservation = self.owner_reservation(owner, id)?;
        reservation.capture()?;
        self.store(&reservation)?;
        info!(reservation_id = %id, "payment captured");
        Ok(reservation)
    }

    /// The renter withdraws one of their reservations, whatever its status.
    pub fn delete_reservation(&self, renter: UserId, id: ReservationId) -> Result<()> {
        self.renter_reservation(renter, id)?;
        self.reservations.delete_reservation(id)?;
        info!(reservation_id = %id, "reservation deleted by renter");
        Ok(())
    }

    /// The space owner removes a reservation on one of their spaces.
    pub fn owner_delete_reservation(&self, owner: UserId, id: ReservationId) -> Result<()> {
        self.owner_reservation(owner, id)?;
        self.reservations.delete_reservation(id)?;
        info!(reservation_id = %id, "reservation deleted by owner");
        Ok(())
    }

    pub fn renter_reservations(&self, renter: UserId) -> Result<Vec<Reservation>> {
        self.reservations.reservations_for_renter(renter)
    }

    /// All reservations of an owned space, any status.
    pub fn space_reservations(&self, owner: UserId, space_id: SpaceId) -> Result<Vec<Reservation>> {
        self.owned_space(owner, space_id)?;
        self.reservations.reservations_for_space(space_id)
    }

    pub fn space_stats(&self, owner: UserId, space_id: SpaceId, today: NaiveDate) -> Result<SpaceStats> {
        let space = self.owned_space(owner, space_id)?;
        let reservations = self.reservations.reservations_for_space(space_id)?;
        Ok(space_stats(&space, &reservations, today))
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn require_space(&self, id: SpaceId) -> Result<Space> {
        self.spaces.space(id)?.ok_or(StowageError::SpaceNotFound(id))
    }

    fn owned_space(&self, owner: UserId, id: SpaceId) -> Result<Space> {
        let space = self.require_space(id)?;
        if !space.is_owned_by(owner) {
            return Err(StowageError::Unauthorized(format!(
                "user {owner} does not own space {id}"
            )));
        }
        Ok(space)
    }

    fn require_reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.reservations
            .reservation(id)?
            .ok_or(StowageError::ReservationNotFound(id))
    }

    /// A reservation on a space owned by `owner`. Orphaned reservations (space
    /// deleted) belong to nobody.
    fn owner_reservation(&self, owner: UserId, id: ReservationId) -> Result<Reservation> {
        let reservation = self.require_reservation(id)?;
        match self.spaces.space(reservation.space_id)? {
            Some(space) if space.is_owned_by(owner) => Ok(reservation),
            _ => Err(StowageError::Unauthorized(format!(
                "user {owner} does not own the space of reservation {id}"
            ))),
        }
    }

    fn renter_reservation(&self, renter: UserId, id: ReservationId) -> Result<Reservation> {
        let reservation = self.require_reservation(id)?;
        if reservation.renter_id != renter {
            return Err(StowageError::Unauthorized(format!(
                "reservation {id} belongs to another renter"
            )));
        }
        Ok(reservation)
    }

    fn store(&self, reservation: &Reservation) -> Result<()> {
        if !self.reservations.update_reservation(reservation.clone())? {
            return Err(StowageError::ReservationNotFound(reservation.id));
        }
        Ok(())
    }

    fn live_reservations(&self, space_id: SpaceId) -> Result<Vec<Reservation>> {
        let all = self.reservations.reservations_for_space(space_id)?;
        Ok(all.into_iter().filter(|r| self.policy.is_live(r)).collect())
    }

    fn booking_lock(&self, space_id: SpaceId) -> Result<Arc<Mutex<()>>> {
        Ok(Arc::clone(self.booking_locks()?.entry(space_id).or_default()))
    }

    fn forget_booking_lock(&self, space_id: SpaceId) -> Result<()> {
        self.booking_locks()?.remove(&space_id);
        Ok(())
    }

    fn booking_locks(&self) -> Result<MutexGuard<'_, HashMap<SpaceId, Arc<Mutex<()>>>>> {
        self.booking_locks
            .lock()
            .map_err(|_| StowageError::Repository("booking lock table poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Location;
    use crate::tier::TierPrices;
    use chrono::TimeZone;

    fn lock_count<S: SpaceRepository, R: ReservationRepository>(market: &Marketplace<S, R>) -> usize {
        market.booking_locks.lock().unwrap().len()
    }

    #[test]
    fn deleting_a_space_drops_its_booking_lock() {
        let market = Marketplace::in_memory(Arc::new(InMemoryStore::new()));
        let owner = UserId::new();
        let space = market
            .add_space(Space::new(
                owner,
                "Box",
                Location {
                    address: "Calle Mayor 1".into(),
                    ..Location::default()
                },
                TierCounts::new(1, 0, 0),
                TierPrices::whole(1, 0, 0),
            ))
            .unwrap();

        market
            .create_reservation(
                ReservationRequest {
                    renter_id: UserId::new(),
                    space_id: space,
                    range: DateRange::parse("2024-06-01", "2024-06-02").unwrap(),
                    quantity: TierCounts::new(1, 0, 0),
                    item_photos: vec![],
                },
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(lock_count(&market), 1);

        market.delete_space(owner, space).unwrap();
        assert_eq!(lock_count(&market), 0);
    }

    #[test]
    fn unknown_spaces_never_get_a_lock() {
        let market = Marketplace::in_memory(Arc::new(InMemoryStore::new()));
        let err = market
            .create_reservation(
                ReservationRequest {
                    renter_id: UserId::new(),
                    space_id: SpaceId::new(),
                    range: DateRange::parse("2024-06-01", "2024-06-02").unwrap(),
                    quantity: TierCounts::new(1, 0, 0),
                    item_photos: vec![],
                },
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, StowageError::SpaceNotFound(_)));
        assert_eq!(lock_count(&market), 0);
    }
}
