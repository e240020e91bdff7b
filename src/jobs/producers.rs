//! Job producers: the scans and designations that feed the registry
//!
//! Producers are the only writers into the pool and are otherwise fully
//! decoupled from agents. The auto-haul scan sweeps loose goods toward
//! stockpiles, craft orders turn into workstation jobs one batch at a
//! time, and marked animals become hunt jobs.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::jobs::job::{HaulCargo, HaulSource, Job, JobPayload, JobType};
use crate::jobs::registry::JobRegistry;
use crate::recipes::RecipeCatalog;
use crate::simulation::events::SimEvent;
use crate::storage::{Stockpiles, StoreQuery};
use crate::core::types::{JobId, Tick, TilePos};
use crate::world::World;

/// Default priorities per producer. Operators can insert hotter jobs
/// directly; these keep background flows ordered sensibly.
pub const HAUL_PRIORITY: f32 = 1.5;
pub const CRAFT_PRIORITY: f32 = 2.0;
pub const HUNT_PRIORITY: f32 = 4.0;
pub const BUILD_PRIORITY: f32 = 2.5;
pub const HARVEST_PRIORITY: f32 = 1.0;

/// Work ticks for the two hauling phases combined
const HAUL_WORK: f32 = 10.0;
const EQUIP_WORK: f32 = 5.0;

/// A standing order to craft `remaining` more batches of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftOrder {
    pub recipe_id: String,
    pub remaining: u32,
}

/// Operator-managed queue of crafting work
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CraftOrderQueue {
    orders: Vec<CraftOrder>,
}

impl CraftOrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, recipe_id: impl Into<String>, count: u32) {
        self.orders.push(CraftOrder {
            recipe_id: recipe_id.into(),
            remaining: count,
        });
    }

    pub fn orders(&self) -> &[CraftOrder] {
        &self.orders
    }

    pub fn outstanding(&self) -> u32 {
        self.orders.iter().map(|o| o.remaining).sum()
    }
}

/// Scan loose ground goods and queue haul jobs toward eligible storage.
///
/// One job per pile; a pile whose job was abandoned gets re-scanned on a
/// later sweep. Piles with no eligible destination stay put until zones
/// change.
pub fn spawn_haul_jobs(
    world: &World,
    stockpiles: &Stockpiles,
    registry: &mut JobRegistry,
    tick: Tick,
    events: &mut Vec<SimEvent>,
) -> usize {
    let mut created = 0;

    let piles: Vec<(TilePos, crate::items::ResourceType, u32)> = world
        .map
        .piles
        .iter()
        .map(|p| (p.pos, p.resource, p.amount))
        .collect();
    for (pos, resource, amount) in piles {
        if registry.has_haul_from(pos) {
            continue;
        }
        let dest = stockpiles.find_store_cell(StoreQuery::Resource { resource, amount }, Some(pos));
        let Some(dest) = dest else { continue };
        if insert_haul(
            registry,
            HaulSource::Ground(pos),
            HaulCargo::Resource { resource, amount },
            Some(dest),
            HAUL_PRIORITY,
            tick,
            events,
        )
        .is_ok()
        {
            created += 1;
        }
    }

    let items: Vec<(TilePos, crate::items::ItemInstance)> = world
        .map
        .loose_items
        .iter()
        .map(|l| (l.pos, l.item.clone()))
        .collect();
    for (pos, item) in items {
        if registry.has_haul_from(pos) {
            continue;
        }
        let dest = stockpiles.find_store_cell(StoreQuery::Item(&item), Some(pos));
        let Some(dest) = dest else { continue };
        if insert_haul(
            registry,
            HaulSource::Ground(pos),
            HaulCargo::Item { item_id: item.id },
            Some(dest),
            HAUL_PRIORITY,
            tick,
            events,
        )
        .is_ok()
        {
            created += 1;
        }
    }

    created
}

pub(crate) fn insert_haul(
    registry: &mut JobRegistry,
    source: HaulSource,
    cargo: HaulCargo,
    dest: Option<TilePos>,
    priority: f32,
    tick: Tick,
    events: &mut Vec<SimEvent>,
) -> Result<JobId> {
    let job = Job::new(
        JobType::Haul,
        JobPayload::Haul {
            cargo,
            source,
            dest,
        },
        source.pos(),
        priority,
        HAUL_WORK,
        tick,
    );
    let id = registry.insert(job)?;
    events.push(SimEvent::JobInserted {
        job: id,
        kind: JobType::Haul,
    });
    Ok(id)
}

/// Queue hunt jobs for animals the operator marked
pub fn spawn_hunt_jobs(
    world: &World,
    registry: &mut JobRegistry,
    tick: Tick,
    events: &mut Vec<SimEvent>,
) -> usize {
    let mut created = 0;
    for animal in &world.animals {
        if !animal.marked_for_hunt || !animal.is_valid_target() {
            continue;
        }
        let already = registry.iter().any(|j| {
            matches!(&j.payload, JobPayload::Hunt { animal: a } if *a == animal.id)
        });
        if already {
            continue;
        }
        let job = Job::new(
            JobType::Hunt,
            JobPayload::Hunt { animal: animal.id },
            animal.pos,
            HUNT_PRIORITY,
            1.0,
            tick,
        );
        if let Ok(id) = registry.insert(job) {
            events.push(SimEvent::JobInserted {
                job: id,
                kind: JobType::Hunt,
            });
            created += 1;
        }
    }
    created
}

/// Turn craft orders into workstation jobs, one outstanding batch per
/// order. The next batch spawns once the previous job leaves the pool.
pub fn spawn_craft_jobs(
    orders: &mut CraftOrderQueue,
    world: &World,
    recipes: &RecipeCatalog,
    registry: &mut JobRegistry,
    tick: Tick,
    events: &mut Vec<SimEvent>,
) -> usize {
    let mut created = 0;
    for order in &mut orders.orders {
        if order.remaining == 0 {
            continue;
        }
        let Some(recipe) = recipes.get(&order.recipe_id) else {
            continue;
        };
        let outstanding = registry.iter().any(|j| {
            matches!(&j.payload, JobPayload::Craft { recipe_id } if *recipe_id == order.recipe_id)
        });
        if outstanding {
            continue;
        }
        let Some(bench) = world.map.workstations(recipe.workstation).next() else {
            continue;
        };
        let job = Job::new(
            JobType::Craft,
            JobPayload::Craft {
                recipe_id: order.recipe_id.clone(),
            },
            bench.pos,
            CRAFT_PRIORITY,
            recipe.work_required,
            tick,
        );
        if let Ok(id) = registry.insert(job) {
            events.push(SimEvent::JobInserted {
                job: id,
                kind: JobType::Craft,
            });
            order.remaining -= 1;
            created += 1;
        }
    }
    orders.orders.retain(|o| o.remaining > 0);
    created
}

/// Designate the node at `pos` for harvesting or salvaging
pub fn designate_harvest(
    world: &World,
    registry: &mut JobRegistry,
    pos: TilePos,
    tick: Tick,
) -> Result<JobId> {
    let node = world
        .node_at(pos)
        .filter(|n| n.has_yield())
        .ok_or_else(|| SimError::MalformedJob(format!("no harvestable node at {:?}", pos)))?;

    let (job_type, payload) = match node.kind {
        crate::world::NodeKind::SalvageHeap => (JobType::Salvage, JobPayload::Salvage),
        _ => (JobType::Harvest, JobPayload::Harvest),
    };
    registry.insert(Job::new(
        job_type,
        payload,
        pos,
        HARVEST_PRIORITY,
        node.kind.work_required(),
        tick,
    ))
}

/// Ask for any stored item matching `tags` to be equipped
pub fn request_equip(
    stockpiles: &Stockpiles,
    registry: &mut JobRegistry,
    tags: Vec<crate::items::Tag>,
    near: Option<TilePos>,
    tick: Tick,
) -> Result<Option<JobId>> {
    let Some((cell, _)) = stockpiles.find_tagged_item(&tags, near) else {
        return Ok(None);
    };
    let id = registry.insert(Job::new(
        JobType::Equip,
        JobPayload::Equip { tags },
        cell,
        1.0,
        EQUIP_WORK,
        tick,
    ))?;
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::items::ResourceType;
    use crate::storage::StorageFilter;
    use crate::world::{AnimalSpecies, NodeKind, StructureKind};

    fn setup() -> (World, Stockpiles, JobRegistry, RecipeCatalog, Vec<SimEvent>) {
        let config = SimulationConfig::default();
        let mut stockpiles = Stockpiles::new(&config);
        stockpiles.create_zone(
            "main",
            vec![TilePos::new(0, 0, 0), TilePos::new(1, 0, 0)],
            StorageFilter::allow_all(),
        );
        (
            World::new(16, 16),
            stockpiles,
            JobRegistry::new(),
            RecipeCatalog::with_defaults(),
            Vec::new(),
        )
    }

    #[test]
    fn test_auto_haul_scan_is_idempotent() {
        let (mut world, stockpiles, mut registry, _, mut events) = setup();
        world
            .map
            .drop_resource(TilePos::new(5, 5, 0), ResourceType::Wood, 4);

        assert_eq!(
            spawn_haul_jobs(&world, &stockpiles, &mut registry, 0, &mut events),
            1
        );
        // Re-running does not duplicate the job
        assert_eq!(
            spawn_haul_jobs(&world, &stockpiles, &mut registry, 1, &mut events),
            0
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_auto_haul_skips_when_no_destination() {
        let config = SimulationConfig::default();
        let mut world = World::new(16, 16);
        let stockpiles = Stockpiles::new(&config); // no zones at all
        let mut registry = JobRegistry::new();
        let mut events = Vec::new();
        world
            .map
            .drop_resource(TilePos::new(5, 5, 0), ResourceType::Wood, 4);

        assert_eq!(
            spawn_haul_jobs(&world, &stockpiles, &mut registry, 0, &mut events),
            0
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_hunt_spawner_only_marks_marked_animals_once() {
        let (mut world, _, mut registry, _, mut events) = setup();
        let id = world.spawn_animal(AnimalSpecies::Deer, TilePos::new(7, 7, 0));
        world.spawn_animal(AnimalSpecies::Rat, TilePos::new(8, 8, 0));

        assert_eq!(spawn_hunt_jobs(&world, &mut registry, 0, &mut events), 0);

        world.animal_mut(id).unwrap().marked_for_hunt = true;
        assert_eq!(spawn_hunt_jobs(&world, &mut registry, 1, &mut events), 1);
        assert_eq!(spawn_hunt_jobs(&world, &mut registry, 2, &mut events), 0);
    }

    #[test]
    fn test_craft_orders_spawn_one_batch_at_a_time() {
        let (mut world, _, mut registry, recipes, mut events) = setup();
        let bench = TilePos::new(9, 9, 0);
        world.map.place_blueprint(bench, StructureKind::Stove);
        world.map.finish_structure(bench);

        let mut orders = CraftOrderQueue::new();
        orders.add("cook_meal", 3);

        assert_eq!(
            spawn_craft_jobs(&mut orders, &world, &recipes, &mut registry, 0, &mut events),
            1
        );
        assert_eq!(orders.outstanding(), 2);
        // Second sweep sees the outstanding job and waits
        assert_eq!(
            spawn_craft_jobs(&mut orders, &world, &recipes, &mut registry, 1, &mut events),
            0
        );

        // Once the job leaves the pool, the next batch spawns
        let job_id = registry.iter().next().unwrap().id;
        registry.remove(job_id);
        assert_eq!(
            spawn_craft_jobs(&mut orders, &world, &recipes, &mut registry, 2, &mut events),
            1
        );
        assert_eq!(orders.outstanding(), 1);
    }

    #[test]
    fn test_craft_orders_need_a_workstation() {
        let (world, _, mut registry, recipes, mut events) = setup();
        let mut orders = CraftOrderQueue::new();
        orders.add("cook_meal", 1);
        assert_eq!(
            spawn_craft_jobs(&mut orders, &world, &recipes, &mut registry, 0, &mut events),
            0
        );
        assert_eq!(orders.outstanding(), 1);
    }

    #[test]
    fn test_designate_harvest_picks_job_type_by_node() {
        let (mut world, _, mut registry, _, _) = setup();
        world.spawn_node(TilePos::new(3, 3, 0), NodeKind::Tree, 8);
        world.spawn_node(TilePos::new(4, 4, 0), NodeKind::SalvageHeap, 6);

        let tree_job = designate_harvest(&world, &mut registry, TilePos::new(3, 3, 0), 0).unwrap();
        let heap_job = designate_harvest(&world, &mut registry, TilePos::new(4, 4, 0), 0).unwrap();
        assert_eq!(registry.get(tree_job).unwrap().job_type, JobType::Harvest);
        assert_eq!(registry.get(heap_job).unwrap().job_type, JobType::Salvage);

        assert!(designate_harvest(&world, &mut registry, TilePos::new(9, 9, 0), 0).is_err());
    }

    #[test]
    fn test_request_equip_targets_item_cell() {
        let (_, mut stockpiles, mut registry, _, _) = setup();
        let catalog = crate::items::ItemCatalog::with_defaults();
        let knife = catalog.spawn("scrap_knife").unwrap();
        stockpiles.store_item(TilePos::new(1, 0, 0), &knife).unwrap();

        let id = request_equip(
            &stockpiles,
            &mut registry,
            vec!["weapon".into()],
            None,
            0,
        )
        .unwrap()
        .expect("knife found");
        assert_eq!(registry.get(id).unwrap().target, TilePos::new(1, 0, 0));

        assert!(request_equip(&stockpiles, &mut registry, vec!["hat".into()], None, 0)
            .unwrap()
            .is_none());
    }
}
