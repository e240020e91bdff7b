//! Filter-change relocation
//!
//! When a zone's filter changes under existing contents, nothing is
//! mutated or deleted in place. The sweep flags the offending cells and
//! queues ordinary haul jobs toward zones that still allow the goods.
//! Contents with no legal destination anywhere keep their misplaced flag
//! and stay where they are; availability beats strict enforcement.

use crate::jobs::job::{HaulCargo, HaulSource};
use crate::jobs::producers::{self, HAUL_PRIORITY};
use crate::jobs::registry::JobRegistry;
use crate::simulation::events::SimEvent;
use crate::storage::{CellContents, StoreQuery, Stockpiles};
use crate::core::types::{Tick, TilePos};

/// Queue relocation hauls for contents that violate their zone filter.
/// Returns the number of jobs created. Call once per tick, before the
/// agents' claim pass, so new jobs are visible the same tick.
pub fn sweep_filter_mismatch(
    stockpiles: &mut Stockpiles,
    registry: &mut JobRegistry,
    tick: Tick,
    events: &mut Vec<SimEvent>,
) -> usize {
    let violating = stockpiles.violating_cells();

    // Flag maintenance: flags live exactly on violating cells
    let all_cells: Vec<TilePos> = stockpiles.cells().iter().map(|c| c.pos).collect();
    for pos in all_cells {
        stockpiles.set_misplaced(pos, violating.contains(&pos));
    }

    let mut created = 0;
    for pos in violating {
        if registry.has_haul_from(pos) {
            continue;
        }

        let cargo = match stockpiles.cell(pos).map(|c| &c.contents) {
            Some(CellContents::Stack { resource, amount }) => {
                // Goods under a live hold are mid-consumption; retry later
                if stockpiles.unreserved_resource_at(pos, *resource) < *amount {
                    continue;
                }
                let dest = stockpiles.find_store_cell(
                    StoreQuery::Resource {
                        resource: *resource,
                        amount: *amount,
                    },
                    Some(pos),
                );
                match dest {
                    Some(d) => Some((
                        HaulCargo::Resource {
                            resource: *resource,
                            amount: *amount,
                        },
                        d,
                    )),
                    None => None,
                }
            }
            Some(CellContents::Items(items)) => {
                // One item per sweep keeps each pass bounded
                let offending = items.iter().find(|i| {
                    !stockpiles
                        .zone_at(pos)
                        .map(|z| z.filter.allows_item(i))
                        .unwrap_or(true)
                        && !stockpiles.ledger().is_item_held(i.id)
                });
                match offending {
                    Some(item) => stockpiles
                        .find_store_cell(StoreQuery::Item(item), Some(pos))
                        .map(|d| (HaulCargo::Item { item_id: item.id }, d)),
                    None => None,
                }
            }
            _ => None,
        };

        let Some((cargo, dest)) = cargo else {
            // No zone anywhere allows these goods; the misplaced flag
            // stays up until filters change again.
            continue;
        };

        let inserted = producers::insert_haul(
            registry,
            HaulSource::Stockpile(pos),
            cargo,
            Some(dest),
            HAUL_PRIORITY,
            tick,
            events,
        );
        if let Ok(id) = inserted {
            tracing::info!(from = ?pos, to = ?dest, "relocating filtered-out goods");
            events.push(SimEvent::RelocationQueued { job: id, from: pos });
            created += 1;
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::items::ResourceType;
    use crate::storage::StorageFilter;

    fn setup() -> (Stockpiles, JobRegistry, Vec<SimEvent>) {
        (
            Stockpiles::new(&SimulationConfig::default()),
            JobRegistry::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_sweep_queues_relocation_and_flags_cell() {
        let (mut sp, mut registry, mut events) = setup();
        let banned = sp
            .create_zone("a", vec![TilePos::new(0, 0, 0)], StorageFilter::allow_all())
            .unwrap();
        sp.create_zone("b", vec![TilePos::new(5, 0, 0)], StorageFilter::allow_all());
        sp.store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 5)
            .unwrap();

        let mut filter = StorageFilter::allow_all();
        filter.allow_wood = false;
        sp.set_filter(banned, filter);

        assert_eq!(sweep_filter_mismatch(&mut sp, &mut registry, 1, &mut events), 1);
        assert!(sp.cell(TilePos::new(0, 0, 0)).unwrap().misplaced);
        assert!(registry.has_haul_from(TilePos::new(0, 0, 0)));

        // Sweep again: the queued job suppresses duplicates
        assert_eq!(sweep_filter_mismatch(&mut sp, &mut registry, 2, &mut events), 0);
    }

    #[test]
    fn test_no_legal_destination_keeps_misplaced_flag() {
        let (mut sp, mut registry, mut events) = setup();
        let only = sp
            .create_zone("only", vec![TilePos::new(0, 0, 0)], StorageFilter::allow_all())
            .unwrap();
        sp.store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 5)
            .unwrap();

        let mut filter = StorageFilter::allow_all();
        filter.allow_wood = false;
        sp.set_filter(only, filter);

        // Nowhere allows wood now: no job, contents stay, flag persists
        assert_eq!(sweep_filter_mismatch(&mut sp, &mut registry, 1, &mut events), 0);
        assert!(sp.cell(TilePos::new(0, 0, 0)).unwrap().misplaced);
        assert_eq!(sp.total_resource(ResourceType::Wood), 5);

        // Filter restored: flag drops without any job
        sp.set_filter(only, StorageFilter::allow_all());
        assert_eq!(sweep_filter_mismatch(&mut sp, &mut registry, 2, &mut events), 0);
        assert!(!sp.cell(TilePos::new(0, 0, 0)).unwrap().misplaced);
    }
}
