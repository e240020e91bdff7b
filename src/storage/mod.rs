//! Resource storage substrate: zones, cells, and the reservation ledger
//!
//! `Stockpiles` is the one choke point through which goods enter, leave,
//! or get promised to jobs. Nothing outside this module mutates cell
//! contents, which is what makes the capacity and reservation invariants
//! enforceable.

pub mod relocation;
pub mod reservation;
pub mod zone;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::items::{ItemInstance, ResourceKey, ResourceType, Tag};
use crate::core::types::{ItemId, JobId, ReservationId, TilePos, ZoneId};

pub use reservation::{Reservation, ReservationLedger, ReservationState, ReservedGoods};
pub use zone::{Cell, CellContents, StorageFilter, StoreError, Zone};

/// One cell's worth of a successful find-and-reserve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedSlice {
    pub id: ReservationId,
    pub cell: TilePos,
    pub amount: u32,
}

/// Goods physically withdrawn by a committed reservation
#[derive(Debug, Clone, PartialEq)]
pub enum CommittedGoods {
    Resource { resource: ResourceType, amount: u32 },
    Item(ItemInstance),
}

/// What a caller wants to put into storage
#[derive(Debug, Clone, Copy)]
pub enum StoreQuery<'a> {
    Resource { resource: ResourceType, amount: u32 },
    Item(&'a ItemInstance),
}

/// The storage layer: all zones, their cells, and the reservation ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stockpiles {
    zones: Vec<Zone>,
    cells: Vec<Cell>,
    ledger: ReservationLedger,
    next_zone_id: u32,
    cell_capacity: u32,
    cell_item_capacity: usize,
}

impl Stockpiles {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            zones: Vec::new(),
            cells: Vec::new(),
            ledger: ReservationLedger::new(),
            next_zone_id: 1,
            cell_capacity: config.cell_capacity,
            cell_item_capacity: config.cell_item_capacity,
        }
    }

    // --- Zones ---

    /// Create a zone covering `tiles`. Tiles already owned by another zone
    /// are skipped; returns None if nothing valid remains.
    pub fn create_zone(
        &mut self,
        name: impl Into<String>,
        tiles: Vec<TilePos>,
        filter: StorageFilter,
    ) -> Option<ZoneId> {
        let valid: Vec<TilePos> = tiles
            .into_iter()
            .filter(|t| self.zone_at(*t).is_none())
            .collect();
        if valid.is_empty() {
            return None;
        }

        let id = ZoneId(self.next_zone_id);
        self.next_zone_id += 1;
        for &pos in &valid {
            self.cells.push(Cell::new(pos));
        }
        self.zones.push(Zone {
            id,
            name: name.into(),
            tiles: valid.into_iter().collect(),
            filter,
        });
        Some(id)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn zone_at(&self, pos: TilePos) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(pos))
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn set_filter(&mut self, id: ZoneId, filter: StorageFilter) -> bool {
        match self.zones.iter_mut().find(|z| z.id == id) {
            Some(zone) => {
                zone.filter = filter;
                true
            }
            None => false,
        }
    }

    // --- Cells ---

    pub fn cell(&self, pos: TilePos) -> Option<&Cell> {
        self.cells.iter().find(|c| c.pos == pos)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn cell_mut(&mut self, pos: TilePos) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.pos == pos)
    }

    pub(crate) fn set_misplaced(&mut self, pos: TilePos, flag: bool) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.misplaced = flag;
        }
    }

    // --- Store ---

    /// Admit a resource stack into the cell at `pos`. All-or-nothing: the
    /// cell must have room for the full amount.
    pub fn store_resource(
        &mut self,
        pos: TilePos,
        resource: ResourceType,
        amount: u32,
    ) -> std::result::Result<(), StoreError> {
        let zone = self.zone_at(pos).ok_or(StoreError::NotStorage)?;
        if !zone.filter.allows_resource(resource) {
            return Err(StoreError::Filtered);
        }
        let capacity = self.cell_capacity;
        let cell = self.cell_mut(pos).ok_or(StoreError::NotStorage)?;

        match &mut cell.contents {
            CellContents::Empty => {
                if amount > capacity {
                    return Err(StoreError::Full);
                }
                cell.contents = CellContents::Stack { resource, amount };
                Ok(())
            }
            CellContents::Stack {
                resource: existing,
                amount: stored,
            } => {
                if *existing != resource {
                    return Err(StoreError::Mixed);
                }
                if *stored + amount > capacity {
                    return Err(StoreError::Full);
                }
                *stored += amount;
                Ok(())
            }
            CellContents::Items(_) => Err(StoreError::Mixed),
        }
    }

    /// Admit a discrete item into the cell at `pos`
    pub fn store_item(
        &mut self,
        pos: TilePos,
        item: &ItemInstance,
    ) -> std::result::Result<(), StoreError> {
        let zone = self.zone_at(pos).ok_or(StoreError::NotStorage)?;
        if !zone.filter.allows_item(item) {
            return Err(StoreError::Filtered);
        }
        let capacity = self.cell_item_capacity;
        let cell = self.cell_mut(pos).ok_or(StoreError::NotStorage)?;

        match &mut cell.contents {
            CellContents::Empty => {
                cell.contents = CellContents::Items(vec![item.clone()]);
                Ok(())
            }
            CellContents::Items(items) => {
                if items.len() >= capacity {
                    return Err(StoreError::Full);
                }
                items.push(item.clone());
                Ok(())
            }
            CellContents::Stack { .. } => Err(StoreError::Mixed),
        }
    }

    /// Find the best cell able to admit the goods: nearest first, and at
    /// equal distance prefer stacking onto an existing pile of the same
    /// resource over opening an empty cell.
    pub fn find_store_cell(&self, query: StoreQuery, from: Option<TilePos>) -> Option<TilePos> {
        let mut candidates: Vec<(u32, u8, (i32, i32, i32))> = Vec::new();

        for cell in &self.cells {
            let zone = match self.zone_at(cell.pos) {
                Some(z) => z,
                None => continue,
            };

            let rank = match query {
                StoreQuery::Resource { resource, amount } => {
                    if !zone.filter.allows_resource(resource) {
                        continue;
                    }
                    match &cell.contents {
                        CellContents::Empty => {
                            if amount > self.cell_capacity {
                                continue;
                            }
                            1
                        }
                        CellContents::Stack {
                            resource: existing,
                            amount: stored,
                        } => {
                            if *existing != resource || stored + amount > self.cell_capacity {
                                continue;
                            }
                            0
                        }
                        CellContents::Items(_) => continue,
                    }
                }
                StoreQuery::Item(item) => {
                    if !zone.filter.allows_item(item) {
                        continue;
                    }
                    match &cell.contents {
                        CellContents::Empty => 1,
                        CellContents::Items(items) => {
                            if items.len() >= self.cell_item_capacity {
                                continue;
                            }
                            0
                        }
                        CellContents::Stack { .. } => continue,
                    }
                }
            };

            let dist = from.map(|f| f.manhattan(&cell.pos)).unwrap_or(0);
            candidates.push((dist, rank, (cell.pos.z, cell.pos.y, cell.pos.x)));
        }

        candidates.sort();
        candidates
            .first()
            .map(|(_, _, (z, y, x))| TilePos::new(*x, *y, *z))
    }

    // --- Reserve / commit / cancel ---

    /// Scan eligible cells for unreserved goods matching `key` and place
    /// holds totalling `amount`. All-or-nothing: if the total available
    /// falls short, nothing is reserved and None is returned.
    pub fn find_and_reserve(
        &mut self,
        key: &ResourceKey,
        amount: u32,
        near: Option<TilePos>,
        job: Option<JobId>,
    ) -> Option<Vec<ReservedSlice>> {
        if amount == 0 {
            return Some(Vec::new());
        }
        match key {
            ResourceKey::Resource(resource) => self.reserve_resource(*resource, amount, near, job),
            ResourceKey::Tagged(tags) => self.reserve_tagged_items(tags, amount, near, job),
        }
    }

    fn reserve_resource(
        &mut self,
        resource: ResourceType,
        amount: u32,
        near: Option<TilePos>,
        job: Option<JobId>,
    ) -> Option<Vec<ReservedSlice>> {
        // Collect availability before touching the ledger
        let mut candidates: Vec<(u32, (i32, i32, i32), TilePos, u32)> = Vec::new();
        for cell in &self.cells {
            let available = self.unreserved_resource_at(cell.pos, resource);
            if available == 0 {
                continue;
            }
            let dist = near.map(|f| f.manhattan(&cell.pos)).unwrap_or(0);
            candidates.push((
                dist,
                (cell.pos.z, cell.pos.y, cell.pos.x),
                cell.pos,
                available,
            ));
        }
        candidates.sort_by_key(|(dist, key, _, _)| (*dist, *key));

        let total: u32 = candidates.iter().map(|(_, _, _, avail)| avail).sum();
        if total < amount {
            return None;
        }

        let mut slices = Vec::new();
        let mut remaining = amount;
        for (_, _, pos, available) in candidates {
            if remaining == 0 {
                break;
            }
            let take = available.min(remaining);
            let id = self.ledger.reserve(
                pos,
                ReservedGoods::Resource {
                    resource,
                    amount: take,
                },
                job,
            );
            slices.push(ReservedSlice {
                id,
                cell: pos,
                amount: take,
            });
            remaining -= take;
        }
        Some(slices)
    }

    fn reserve_tagged_items(
        &mut self,
        tags: &[Tag],
        count: u32,
        near: Option<TilePos>,
        job: Option<JobId>,
    ) -> Option<Vec<ReservedSlice>> {
        // Gather unreserved matching items, nearest cells first
        let mut found: Vec<(u32, (i32, i32, i32), TilePos, ItemId)> = Vec::new();
        for cell in &self.cells {
            if let CellContents::Items(items) = &cell.contents {
                for item in items {
                    if crate::items::matches_tags(tags, &item.tags)
                        && !self.ledger.is_item_held(item.id)
                    {
                        let dist = near.map(|f| f.manhattan(&cell.pos)).unwrap_or(0);
                        found.push((dist, (cell.pos.z, cell.pos.y, cell.pos.x), cell.pos, item.id));
                    }
                }
            }
        }
        if (found.len() as u32) < count {
            return None;
        }
        found.sort_by_key(|(dist, key, _, _)| (*dist, *key));

        let slices = found
            .into_iter()
            .take(count as usize)
            .map(|(_, _, pos, item_id)| {
                let id = self
                    .ledger
                    .reserve(pos, ReservedGoods::Item { item_id }, job);
                ReservedSlice {
                    id,
                    cell: pos,
                    amount: 1,
                }
            })
            .collect();
        Some(slices)
    }

    /// Reserve goods at one specific cell, used by hauling pick-up where
    /// the source is fixed by the job rather than searched.
    pub fn reserve_at(
        &mut self,
        cell: TilePos,
        goods: ReservedGoods,
        job: Option<JobId>,
    ) -> Option<ReservationId> {
        match &goods {
            ReservedGoods::Resource { resource, amount } => {
                if self.unreserved_resource_at(cell, *resource) < *amount {
                    return None;
                }
            }
            ReservedGoods::Item { item_id } => {
                let present = matches!(
                    self.cell(cell).map(|c| &c.contents),
                    Some(CellContents::Items(items)) if items.iter().any(|i| i.id == *item_id)
                );
                if !present || self.ledger.is_item_held(*item_id) {
                    return None;
                }
            }
        }
        Some(self.ledger.reserve(cell, goods, job))
    }

    /// Convert a hold into an actual withdrawal. Exactly-once; a second
    /// settle attempt is rejected by the ledger.
    pub fn commit_reservation(&mut self, id: ReservationId) -> Result<CommittedGoods> {
        let reservation = self.ledger.commit(id)?;
        match reservation.goods {
            ReservedGoods::Resource { resource, amount } => {
                if let Some(cell) = self.cell_mut(reservation.cell) {
                    if let CellContents::Stack {
                        amount: stored, ..
                    } = &mut cell.contents
                    {
                        *stored = stored.saturating_sub(amount);
                    }
                    if cell.contents.is_empty() {
                        cell.contents = CellContents::Empty;
                        cell.misplaced = false;
                    }
                }
                Ok(CommittedGoods::Resource { resource, amount })
            }
            ReservedGoods::Item { item_id } => {
                let item = self
                    .take_item_from_cell(reservation.cell, item_id)
                    .ok_or(crate::core::error::SimError::ReservationNotFound(id))?;
                Ok(CommittedGoods::Item(item))
            }
        }
    }

    /// Release a hold without withdrawal
    pub fn cancel_reservation(&mut self, id: ReservationId) -> Result<()> {
        self.ledger.cancel(id)?;
        Ok(())
    }

    /// Cancel every live hold a job still has. Called on abandonment so
    /// reservations can never leak.
    pub fn release_job(&mut self, job: JobId) -> usize {
        let held = self.ledger.held_by_job(job);
        let count = held.len();
        for id in held {
            // Ids came from the held set, cancel cannot fail
            let _ = self.ledger.cancel(id);
        }
        count
    }

    fn take_item_from_cell(&mut self, pos: TilePos, item_id: ItemId) -> Option<ItemInstance> {
        let cell = self.cell_mut(pos)?;
        if let CellContents::Items(items) = &mut cell.contents {
            let idx = items.iter().position(|i| i.id == item_id)?;
            let item = items.remove(idx);
            if items.is_empty() {
                cell.contents = CellContents::Empty;
                cell.misplaced = false;
            }
            return Some(item);
        }
        None
    }

    // --- Queries ---

    pub fn unreserved_resource_at(&self, pos: TilePos, resource: ResourceType) -> u32 {
        let stored = match self.cell(pos).map(|c| &c.contents) {
            Some(CellContents::Stack {
                resource: res,
                amount,
            }) if *res == resource => *amount,
            _ => 0,
        };
        stored.saturating_sub(self.ledger.held_resource_at(pos, resource))
    }

    /// Total stored units of a resource, ignoring reservations. This is
    /// the cheap existence check used by candidate queries.
    pub fn total_resource(&self, resource: ResourceType) -> u32 {
        self.cells
            .iter()
            .filter_map(|c| match &c.contents {
                CellContents::Stack {
                    resource: res,
                    amount,
                } if *res == resource => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Number of stored items carrying all of `tags`, ignoring reservations
    pub fn total_matching_items(&self, tags: &[Tag]) -> u32 {
        self.cells
            .iter()
            .filter_map(|c| match &c.contents {
                CellContents::Items(items) => Some(
                    items
                        .iter()
                        .filter(|i| crate::items::matches_tags(tags, &i.tags))
                        .count() as u32,
                ),
                _ => None,
            })
            .sum()
    }

    /// Nearest unreserved stored item carrying all of `tags`
    pub fn find_tagged_item(
        &self,
        tags: &[Tag],
        near: Option<TilePos>,
    ) -> Option<(TilePos, ItemId)> {
        let mut found: Vec<(u32, (i32, i32, i32), TilePos, ItemId)> = Vec::new();
        for cell in &self.cells {
            if let CellContents::Items(items) = &cell.contents {
                for item in items {
                    if crate::items::matches_tags(tags, &item.tags)
                        && !self.ledger.is_item_held(item.id)
                    {
                        let dist = near.map(|f| f.manhattan(&cell.pos)).unwrap_or(0);
                        found.push((dist, (cell.pos.z, cell.pos.y, cell.pos.x), cell.pos, item.id));
                    }
                }
            }
        }
        found.sort_by_key(|(dist, key, _, _)| (*dist, *key));
        found.first().map(|(_, _, pos, id)| (*pos, *id))
    }

    /// Cheap existence check for a requirement key
    pub fn plausibly_available(&self, key: &ResourceKey, amount: u32) -> bool {
        match key {
            ResourceKey::Resource(resource) => self.total_resource(*resource) >= amount,
            ResourceKey::Tagged(tags) => self.total_matching_items(tags) >= amount,
        }
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    /// Drop settled ledger records
    pub fn compact_ledger(&mut self) {
        self.ledger.compact();
    }

    /// Cells whose contents the owning zone's filter no longer allows
    pub fn violating_cells(&self) -> Vec<TilePos> {
        let mut out = Vec::new();
        for cell in &self.cells {
            let zone = match self.zone_at(cell.pos) {
                Some(z) => z,
                None => continue,
            };
            let violates = match &cell.contents {
                CellContents::Empty => false,
                CellContents::Stack { resource, amount } => {
                    *amount > 0 && !zone.filter.allows_resource(*resource)
                }
                CellContents::Items(items) => {
                    items.iter().any(|i| !zone.filter.allows_item(i))
                }
            };
            if violates {
                out.push(cell.pos);
            }
        }
        out.sort_by_key(|p| (p.z, p.y, p.x));
        out
    }

    /// Check the structural invariants: stored never exceeds capacity and
    /// live holds never exceed what is physically present.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for cell in &self.cells {
            match &cell.contents {
                CellContents::Stack { resource, amount } => {
                    if *amount > self.cell_capacity {
                        return Err(format!(
                            "cell {:?} stores {} > capacity {}",
                            cell.pos, amount, self.cell_capacity
                        ));
                    }
                    let held = self.ledger.held_resource_at(cell.pos, *resource);
                    if held > *amount {
                        return Err(format!(
                            "cell {:?} has {} held > {} stored",
                            cell.pos, held, amount
                        ));
                    }
                }
                CellContents::Items(items) => {
                    if items.len() > self.cell_item_capacity {
                        return Err(format!(
                            "cell {:?} holds {} items > capacity {}",
                            cell.pos,
                            items.len(),
                            self.cell_item_capacity
                        ));
                    }
                }
                CellContents::Empty => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Stockpiles {
        let mut config = SimulationConfig::default();
        config.cell_capacity = 10;
        config.cell_item_capacity = 2;
        Stockpiles::new(&config)
    }

    fn tiles(n: i32) -> Vec<TilePos> {
        (0..n).map(|i| TilePos::new(i, 0, 0)).collect()
    }

    #[test]
    fn test_store_respects_capacity_and_filter() {
        let mut sp = layer();
        sp.create_zone("main", tiles(1), StorageFilter::allow_all());
        let pos = TilePos::new(0, 0, 0);

        assert!(sp.store_resource(pos, ResourceType::Wood, 6).is_ok());
        assert_eq!(
            sp.store_resource(pos, ResourceType::Wood, 6),
            Err(StoreError::Full)
        );
        assert_eq!(
            sp.store_resource(pos, ResourceType::Stone, 1),
            Err(StoreError::Mixed)
        );
        assert_eq!(
            sp.store_resource(TilePos::new(5, 5, 0), ResourceType::Wood, 1),
            Err(StoreError::NotStorage)
        );

        let mut filter = StorageFilter::allow_all();
        filter.allow_wood = false;
        let id = sp.zone_at(pos).unwrap().id;
        sp.set_filter(id, filter);
        assert_eq!(
            sp.store_resource(pos, ResourceType::Wood, 1),
            Err(StoreError::Filtered)
        );

        assert!(sp.check_invariants().is_ok());
    }

    #[test]
    fn test_find_store_cell_prefers_stacking() {
        let mut sp = layer();
        sp.create_zone("main", tiles(3), StorageFilter::allow_all());
        // Cell 2 already has wood; cells 0 and 1 are empty and nearer
        sp.store_resource(TilePos::new(2, 0, 0), ResourceType::Wood, 3)
            .unwrap();

        // From x=2 the stack is at distance 0 and wins outright
        let near = sp.find_store_cell(
            StoreQuery::Resource {
                resource: ResourceType::Wood,
                amount: 2,
            },
            Some(TilePos::new(2, 0, 0)),
        );
        assert_eq!(near, Some(TilePos::new(2, 0, 0)));

        // Distance dominates: from x=0 the empty cell at 0 wins
        let far = sp.find_store_cell(
            StoreQuery::Resource {
                resource: ResourceType::Wood,
                amount: 2,
            },
            Some(TilePos::new(0, 0, 0)),
        );
        assert_eq!(far, Some(TilePos::new(0, 0, 0)));
    }

    #[test]
    fn test_find_and_reserve_all_or_nothing() {
        let mut sp = layer();
        sp.create_zone("main", tiles(2), StorageFilter::allow_all());
        sp.store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 4)
            .unwrap();
        sp.store_resource(TilePos::new(1, 0, 0), ResourceType::Wood, 3)
            .unwrap();

        // More than exists anywhere: nothing must be reserved
        assert!(sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Wood), 8, None, None)
            .is_none());
        assert_eq!(sp.ledger().held_count(), 0);

        // Spans two cells
        let slices = sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Wood), 6, None, None)
            .expect("6 of 7 available");
        assert_eq!(slices.iter().map(|s| s.amount).sum::<u32>(), 6);
        assert_eq!(slices.len(), 2);

        // The remaining single unit is still reservable, a seventh is not
        assert!(sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Wood), 2, None, None)
            .is_none());
        assert!(sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Wood), 1, None, None)
            .is_some());

        assert!(sp.check_invariants().is_ok());
    }

    #[test]
    fn test_commit_withdraws_and_cancel_releases() {
        let mut sp = layer();
        sp.create_zone("main", tiles(1), StorageFilter::allow_all());
        let pos = TilePos::new(0, 0, 0);
        sp.store_resource(pos, ResourceType::Metal, 5).unwrap();

        let slices = sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Metal), 3, None, None)
            .unwrap();
        assert_eq!(sp.unreserved_resource_at(pos, ResourceType::Metal), 2);

        let goods = sp.commit_reservation(slices[0].id).unwrap();
        assert_eq!(
            goods,
            CommittedGoods::Resource {
                resource: ResourceType::Metal,
                amount: 3
            }
        );
        assert_eq!(sp.total_resource(ResourceType::Metal), 2);
        // Double settle rejected
        assert!(sp.commit_reservation(slices[0].id).is_err());

        let again = sp
            .find_and_reserve(&ResourceKey::Resource(ResourceType::Metal), 2, None, None)
            .unwrap();
        sp.cancel_reservation(again[0].id).unwrap();
        assert_eq!(sp.total_resource(ResourceType::Metal), 2);
        assert_eq!(sp.unreserved_resource_at(pos, ResourceType::Metal), 2);
    }

    #[test]
    fn test_tagged_item_reservation() {
        let mut sp = layer();
        sp.create_zone("main", tiles(2), StorageFilter::allow_all());
        let catalog = crate::items::ItemCatalog::with_defaults();
        let meat = catalog.spawn("raw_meat").unwrap();
        let knife = catalog.spawn("scrap_knife").unwrap();
        sp.store_item(TilePos::new(0, 0, 0), &meat).unwrap();
        sp.store_item(TilePos::new(1, 0, 0), &knife).unwrap();

        // Two meats requested, only one exists
        assert!(sp
            .find_and_reserve(&ResourceKey::tagged(&["meat"]), 2, None, None)
            .is_none());

        let slices = sp
            .find_and_reserve(&ResourceKey::tagged(&["meat"]), 1, None, None)
            .expect("one meat available");
        assert_eq!(slices.len(), 1);

        // The held item cannot be reserved twice
        assert!(sp
            .find_and_reserve(&ResourceKey::tagged(&["meat"]), 1, None, None)
            .is_none());

        match sp.commit_reservation(slices[0].id).unwrap() {
            CommittedGoods::Item(item) => assert_eq!(item.def_id, "raw_meat"),
            other => panic!("expected item, got {:?}", other),
        }
        assert_eq!(sp.total_matching_items(&["meat".to_string()]), 0);
    }

    #[test]
    fn test_release_job_cancels_all_holds() {
        let mut sp = layer();
        sp.create_zone("main", tiles(2), StorageFilter::allow_all());
        sp.store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 5)
            .unwrap();
        sp.store_resource(TilePos::new(1, 0, 0), ResourceType::Scrap, 5)
            .unwrap();

        let job = JobId::new();
        sp.find_and_reserve(
            &ResourceKey::Resource(ResourceType::Wood),
            2,
            None,
            Some(job),
        )
        .unwrap();
        sp.find_and_reserve(
            &ResourceKey::Resource(ResourceType::Scrap),
            3,
            None,
            Some(job),
        )
        .unwrap();
        assert_eq!(sp.ledger().held_count(), 2);

        assert_eq!(sp.release_job(job), 2);
        assert_eq!(sp.ledger().held_count(), 0);
        assert_eq!(sp.total_resource(ResourceType::Wood), 5);
    }

    #[test]
    fn test_violating_cells_after_filter_change() {
        let mut sp = layer();
        let id = sp
            .create_zone("main", tiles(2), StorageFilter::allow_all())
            .unwrap();
        sp.store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 5)
            .unwrap();
        assert!(sp.violating_cells().is_empty());

        let mut filter = StorageFilter::allow_all();
        filter.allow_wood = false;
        sp.set_filter(id, filter);
        assert_eq!(sp.violating_cells(), vec![TilePos::new(0, 0, 0)]);
    }
}
