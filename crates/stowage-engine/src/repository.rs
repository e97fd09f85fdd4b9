//! Persistence seams for spaces and reservations, plus an in-memory store.
//!
//! Relationship traversal is always an explicit lookup by id. Repositories
//! return every matching record; deciding which reservations are live is the
//! caller's job (see [`LivePolicy`](crate::live::LivePolicy)).

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StowageError};
use crate::ids::{ReservationId, SpaceId, UserId};
use crate::reservation::Reservation;
use crate::space::Space;

pub trait SpaceRepository: Send + Sync {
    fn space(&self, id: SpaceId) -> Result<Option<Space>>;
    fn spaces(&self) -> Result<Vec<Space>>;
    fn spaces_by_owner(&self, owner: UserId) -> Result<Vec<Space>>;
    fn insert_space(&self, space: Space) -> Result<()>;
    /// Replace a stored space. Returns false if it did not exist.
    fn update_space(&self, space: Space) -> Result<bool>;
    /// Returns false if it did not exist. Reservations are left untouched.
    fn delete_space(&self, id: SpaceId) -> Result<bool>;
}

pub trait ReservationRepository: Send + Sync {
    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>>;
    /// All reservations of a space, in any status.
    fn reservations_for_space(&self, space: SpaceId) -> Result<Vec<Reservation>>;
    fn reservations_for_renter(&self, renter: UserId) -> Result<Vec<Reservation>>;
    fn insert_reservation(&self, reservation: Reservation) -> Result<()>;
    /// Replace a stored reservation. Returns false if it did not exist.
    fn update_reservation(&self, reservation: Reservation) -> Result<bool>;
    /// Returns false if it did not exist.
    fn delete_reservation(&self, id: ReservationId) -> Result<bool>;
}

/// Serializable dump of a whole marketplace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// Both repositories over `RwLock`ed vectors. Listing order is insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    spaces: RwLock<Vec<Space>>,
    reservations: RwLock<Vec<Reservation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: MarketSnapshot) -> Self {
        Self {
            spaces: RwLock::new(snapshot.spaces),
            reservations: RwLock::new(snapshot.reservations),
        }
    }

    pub fn snapshot(&self) -> Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            spaces: read(&self.spaces)?.clone(),
            reservations: read(&self.reservations)?.clone(),
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StowageError::Repository("store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StowageError::Repository("store lock poisoned".into()))
}

impl SpaceRepository for InMemoryStore {
    fn space(&self, id: SpaceId) -> Result<Option<Space>> {
        Ok(read(&self.spaces)?.iter().find(|s| s.id == id).cloned())
    }

    fn spaces(&self) -> Result<Vec<Space>> {
        Ok(read(&self.spaces)?.clone())
    }

    fn spaces_by_owner(&self, owner: UserId) -> Result<Vec<Space>> {
        Ok(read(&self.spaces)?
            .iter()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect())
    }

    fn insert_space(&self, space: Space) -> Result<()> {
        let mut spaces = write(&self.spaces)?;
        if spaces.iter().any(|s| s.id == space.id) {
            return Err(StowageError::Repository(format!(
                "space {} already exists",
                space.id
            )));
        }
        spaces.push(space);
        Ok(())
    }

    fn update_space(&self, space: Space) -> Result<bool> {
        let mut spaces = write(&self.spaces)?;
        match spaces.iter_mut().find(|s| s.id == space.id) {
            Some(slot) => {
                *slot = space;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_space(&self, id: SpaceId) -> Result<bool> {
        let mut spaces = write(&self.spaces)?;
        let before = spaces.len();
        spaces.retain(|s| s.id != id);
        Ok(spaces.len() != before)
    }
}

impl ReservationRepository for InMemoryStore {
    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(read(&self.reservations)?
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn reservations_for_space(&self, space: SpaceId) -> Result<Vec<Reservation>> {
        Ok(read(&self.reservations)?
            .iter()
            .filter(|r| r.space_id == space)
            .cloned()
            .collect())
    }

    fn reservations_for_renter(&self, renter: UserId) -> Result<Vec<Reservation>> {
        Ok(read(&self.reservations)?
            .iter()
            .filter(|r| r.renter_id == renter)
            .cloned()
            .collect())
    }

    fn insert_reservation(&self, reservation: Reservation) -> Result<()> {
        let mut reservations = write(&self.reservations)?;
        if reservations.iter().any(|r| r.id == reservation.id) {
            return Err(StowageError::Repository(format!(
                "reservation {} already exists",
                reservation.id
            )));
        }
        reservations.push(reservation);
        Ok(())
    }

    fn update_reservation(&self, reservation: Reservation) -> Result<bool> {
        let mut reservations = write(&self.reservations)?;
        match reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(slot) => {
                *slot = reservation;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_reservation(&self, id: ReservationId) -> Result<bool> {
        let mut reservations = write(&self.reservations)?;
        let before = reservations.len();
        reservations.retain(|r| r.id != id);
        Ok(reservations.len() != before)
    }
}
