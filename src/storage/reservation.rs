//! Reservation ledger
//!
//! A reservation is an ephemeral hold on goods at a specific cell. Every
//! hold is settled exactly once, by commit (withdrawal at the moment of
//! consumption) or cancel (job abandoned). The ledger rejects a second
//! settle instead of double-applying it.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::items::ResourceType;
use crate::core::types::{ItemId, JobId, ReservationId, TilePos};

/// What a reservation holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReservedGoods {
    Resource { resource: ResourceType, amount: u32 },
    Item { item_id: ItemId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationState {
    Held,
    Committed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub cell: TilePos,
    pub goods: ReservedGoods,
    /// The job holding this reservation, if any
    pub job: Option<JobId>,
    pub state: ReservationState,
}

/// All reservations, live and settled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationLedger {
    reservations: Vec<Reservation>,
    next_id: u64,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, cell: TilePos, goods: ReservedGoods, job: Option<JobId>) -> ReservationId {
        let id = ReservationId(self.next_id);
        self.next_id += 1;
        self.reservations.push(Reservation {
            id,
            cell,
            goods,
            job,
            state: ReservationState::Held,
        });
        id
    }

    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: ReservationId) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Mark the reservation committed. The caller performs the physical
    /// withdrawal; the ledger only enforces the exactly-once discipline.
    pub fn commit(&mut self, id: ReservationId) -> Result<Reservation> {
        let r = self
            .get_mut(id)
            .ok_or(SimError::ReservationNotFound(id))?;
        if r.state != ReservationState::Held {
            return Err(SimError::ReservationSettled(id));
        }
        r.state = ReservationState::Committed;
        Ok(r.clone())
    }

    /// Release the hold without withdrawal
    pub fn cancel(&mut self, id: ReservationId) -> Result<Reservation> {
        let r = self
            .get_mut(id)
            .ok_or(SimError::ReservationNotFound(id))?;
        if r.state != ReservationState::Held {
            return Err(SimError::ReservationSettled(id));
        }
        r.state = ReservationState::Cancelled;
        Ok(r.clone())
    }

    /// Units of `resource` held against `cell`
    pub fn held_resource_at(&self, cell: TilePos, resource: ResourceType) -> u32 {
        self.reservations
            .iter()
            .filter(|r| r.state == ReservationState::Held && r.cell == cell)
            .filter_map(|r| match &r.goods {
                ReservedGoods::Resource {
                    resource: res,
                    amount,
                } if *res == resource => Some(*amount),
                _ => None,
            })
            .sum()
    }

    pub fn is_item_held(&self, item_id: ItemId) -> bool {
        self.reservations.iter().any(|r| {
            r.state == ReservationState::Held
                && matches!(r.goods, ReservedGoods::Item { item_id: held } if held == item_id)
        })
    }

    /// Live reservation ids held by a job
    pub fn held_by_job(&self, job: JobId) -> Vec<ReservationId> {
        self.reservations
            .iter()
            .filter(|r| r.state == ReservationState::Held && r.job == Some(job))
            .map(|r| r.id)
            .collect()
    }

    pub fn held_count(&self) -> usize {
        self.reservations
            .iter()
            .filter(|r| r.state == ReservationState::Held)
            .count()
    }

    /// Drop settled records to keep the ledger bounded
    pub fn compact(&mut self) {
        self.reservations
            .retain(|r| r.state == ReservationState::Held);
    }
}
