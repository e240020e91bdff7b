//! Hauling and equip engines
//!
//! Hauling is two-phase: pick up (withdraw from a ground pile or commit a
//! stockpile reservation), then drop off at a destination cell. A
//! destination that turned invalid mid-carry is re-searched once; after
//! that the job abandons and the cleanup path drops the cargo where the
//! agent stands.
//!
//! Equip follows the pick-up shape but the destination is the agent.

use crate::agents::{Agent, CarriedGoods};
use crate::engines::{EngineCtx, Progress};
use crate::jobs::job::{BlockReason, HaulCargo, HaulSource, Job, JobPayload};
use crate::storage::{CommittedGoods, ReservedGoods, StoreQuery};
use crate::core::types::TilePos;

pub fn advance(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    if !job.exec.picked_up {
        pick_up(ctx, agent, job, delta)
    } else {
        drop_off(ctx, agent, job, delta)
    }
}

fn pick_up(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    let (cargo, source) = match &job.payload {
        JobPayload::Haul { cargo, source, .. } => (cargo.clone(), *source),
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
    };

    if !agent.pos.is_adjacent(&source.pos()) {
        return Progress::Travel(source.pos());
    }

    let carried = match source {
        HaulSource::Ground(pos) => match &cargo {
            HaulCargo::Resource { resource, amount } => {
                match ctx.world.map.take_pile(pos, *amount) {
                    Some((res, taken)) if res == *resource => CarriedGoods::Resource {
                        resource: res,
                        amount: taken,
                    },
                    // Pile gone or the wrong kind appeared in a race
                    _ => return Progress::Blocked(BlockReason::InvalidTarget),
                }
            }
            HaulCargo::Item { item_id } => match ctx.world.map.take_item_by_id(pos, *item_id) {
                Some(item) => CarriedGoods::Item(item),
                None => return Progress::Blocked(BlockReason::InvalidTarget),
            },
        },
        HaulSource::Stockpile(pos) => {
            // Relocation hauls withdraw through the ledger like any
            // other consumer.
            let goods = match &cargo {
                HaulCargo::Resource { resource, amount } => ReservedGoods::Resource {
                    resource: *resource,
                    amount: *amount,
                },
                HaulCargo::Item { item_id } => ReservedGoods::Item { item_id: *item_id },
            };
            let reservation = match ctx.stockpiles.reserve_at(pos, goods, Some(job.id)) {
                Some(id) => id,
                None => return Progress::Blocked(BlockReason::InvalidTarget),
            };
            match ctx.stockpiles.commit_reservation(reservation) {
                Ok(CommittedGoods::Resource { resource, amount }) => {
                    CarriedGoods::Resource { resource, amount }
                }
                Ok(CommittedGoods::Item(item)) => CarriedGoods::Item(item),
                Err(_) => return Progress::Blocked(BlockReason::InvalidTarget),
            }
        }
    };

    agent.carrying = Some(carried);
    job.exec.picked_up = true;
    job.accumulated_progress += delta;

    match haul_dest(ctx, agent, job) {
        Some(dest) => Progress::Travel(dest),
        None => Progress::Blocked(BlockReason::NoStorage),
    }
}

fn drop_off(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    let dest = match haul_dest(ctx, agent, job) {
        Some(d) => d,
        None => return Progress::Blocked(BlockReason::NoStorage),
    };
    if !agent.pos.is_adjacent(&dest) {
        return Progress::Travel(dest);
    }

    let stored = match &agent.carrying {
        Some(CarriedGoods::Resource { resource, amount }) => ctx
            .stockpiles
            .store_resource(dest, *resource, *amount)
            .is_ok(),
        Some(CarriedGoods::Item(item)) => ctx.stockpiles.store_item(dest, item).is_ok(),
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };

    if stored {
        agent.carrying = None;
        job.accumulated_progress = (job.accumulated_progress + delta).max(job.required_progress);
        return Progress::Completed;
    }

    // Destination filled up or its filter changed mid-carry: search once
    if !job.exec.research_done {
        job.exec.research_done = true;
        let query = match &agent.carrying {
            Some(CarriedGoods::Resource { resource, amount }) => StoreQuery::Resource {
                resource: *resource,
                amount: *amount,
            },
            Some(CarriedGoods::Item(item)) => StoreQuery::Item(item),
            None => return Progress::Blocked(BlockReason::InvalidTarget),
        };
        if let Some(new_dest) = ctx.stockpiles.find_store_cell(query, Some(agent.pos)) {
            set_haul_dest(job, new_dest);
            return Progress::Travel(new_dest);
        }
    }

    // No legal destination anywhere; the state machine abandons and the
    // cleanup path drops the cargo rather than discarding it.
    Progress::Blocked(BlockReason::NoStorage)
}

/// Current destination, choosing one now if the job was created without
fn haul_dest(ctx: &mut EngineCtx, agent: &Agent, job: &mut Job) -> Option<TilePos> {
    if let JobPayload::Haul { dest, .. } = &job.payload {
        if let Some(d) = dest {
            return Some(*d);
        }
    }
    let query = match &agent.carrying {
        Some(CarriedGoods::Resource { resource, amount }) => StoreQuery::Resource {
            resource: *resource,
            amount: *amount,
        },
        Some(CarriedGoods::Item(item)) => StoreQuery::Item(item),
        None => return None,
    };
    let found = ctx.stockpiles.find_store_cell(query, Some(agent.pos))?;
    set_haul_dest(job, found);
    Some(found)
}

fn set_haul_dest(job: &mut Job, new_dest: TilePos) {
    if let JobPayload::Haul { dest, .. } = &mut job.payload {
        *dest = Some(new_dest);
    }
}

/// Equip: fetch a tag-matched item from storage onto the agent
pub fn advance_equip(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    let tags = match &job.payload {
        JobPayload::Equip { tags } => tags.clone(),
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
    };

    if !agent.pos.is_adjacent(&job.target) {
        return Progress::Travel(job.target);
    }

    // Find a matching unreserved item on the target cell
    let item_id = ctx
        .stockpiles
        .cell(job.target)
        .and_then(|cell| match &cell.contents {
            crate::storage::CellContents::Items(items) => items
                .iter()
                .find(|i| {
                    crate::items::matches_tags(&tags, &i.tags)
                        && !ctx.stockpiles.ledger().is_item_held(i.id)
                })
                .map(|i| i.id),
            _ => None,
        });

    let item_id = match item_id {
        Some(id) => id,
        None => {
            // The item was taken since the job was created; look elsewhere
            // once, then give up.
            if !job.exec.research_done {
                job.exec.research_done = true;
                if let Some((pos, _)) = ctx.stockpiles.find_tagged_item(&tags, Some(agent.pos)) {
                    job.target = pos;
                    return Progress::Travel(pos);
                }
            }
            return Progress::Blocked(BlockReason::InvalidTarget);
        }
    };

    let reservation = match ctx.stockpiles.reserve_at(
        job.target,
        ReservedGoods::Item { item_id },
        Some(job.id),
    ) {
        Some(id) => id,
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    match ctx.stockpiles.commit_reservation(reservation) {
        Ok(CommittedGoods::Item(item)) => {
            tracing::debug!(agent = %agent.name, item = %item.def_id, "equipped");
            agent.equipment.push(item);
            job.accumulated_progress = (job.accumulated_progress + delta).max(job.required_progress);
            Progress::Completed
        }
        _ => Progress::Blocked(BlockReason::InvalidTarget),
    }
}
