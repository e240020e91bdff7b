//! Headless simulation runner
//!
//! Builds a small demo colony, runs it for a fixed number of ticks, and
//! logs scheduling activity. Useful for watching the scheduler behave
//! without any presentation layer.

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use scrapstead::agents::{Agent, WorkerTraits};
use scrapstead::core::config::SimulationConfig;
use scrapstead::items::ResourceType;
use scrapstead::jobs::JobCategory;
use scrapstead::simulation::{run_tick, Colony, SimEvent};
use scrapstead::storage::StorageFilter;
use scrapstead::core::types::TilePos;
use scrapstead::world::{AnimalSpecies, GridPathfinder, NodeKind, StructureKind};

#[derive(Parser, Debug)]
#[command(name = "scrapstead", about = "Colony survival simulation")]
struct Args {
    /// Ticks to simulate
    #[arg(long, default_value_t = 2000)]
    ticks: u32,

    /// World seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Number of colonists
    #[arg(long, default_value_t = 4)]
    colonists: u32,

    /// Print a summary every N ticks
    #[arg(long, default_value_t = 200)]
    report_every: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(seed = args.seed, ticks = args.ticks, "scrapstead starting");

    let config = SimulationConfig::default();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return;
    }

    let mut colony = build_demo_colony(config, args.seed, args.colonists);
    let pathfinder = GridPathfinder::new();

    let mut completed = 0u32;
    let mut abandoned = 0u32;
    for _ in 0..args.ticks {
        let events = run_tick(&mut colony, &pathfinder);
        for event in &events {
            match event {
                SimEvent::JobCompleted { kind, .. } => {
                    completed += 1;
                    tracing::debug!(%kind, "job completed");
                }
                SimEvent::JobAbandoned { reason, .. } => {
                    abandoned += 1;
                    tracing::debug!(%reason, "job abandoned");
                }
                SimEvent::AgentStarved { .. } => {
                    tracing::warn!("a colonist starved");
                }
                _ => {}
            }
        }

        if colony.tick % u64::from(args.report_every) == 0 {
            report(&colony, completed, abandoned);
        }
    }

    report(&colony, completed, abandoned);
    tracing::info!("simulation finished");
}

fn report(colony: &Colony, completed: u32, abandoned: u32) {
    let blocked = colony.blocked_jobs();
    tracing::info!(
        tick = colony.tick,
        jobs = colony.registry.len(),
        completed,
        abandoned,
        wood = colony.stockpiles.total_resource(ResourceType::Wood),
        scrap = colony.stockpiles.total_resource(ResourceType::Scrap),
        meals = colony.stockpiles.total_resource(ResourceType::Meal),
        "colony status"
    );
    for (reason, count) in blocked {
        tracing::info!(%reason, count, "jobs blocked");
    }
}

fn build_demo_colony(config: SimulationConfig, seed: u64, colonists: u32) -> Colony {
    let mut colony = Colony::new(48, 32, config, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Storage: a general stockpile and a food pantry
    let main_tiles: Vec<TilePos> = (0..12).map(|i| TilePos::new(4 + i % 4, 4 + i / 4, 0)).collect();
    colony
        .stockpiles
        .create_zone("main", main_tiles, StorageFilter::allow_all());

    let mut pantry_filter = StorageFilter::allow_all();
    pantry_filter.allow_wood = false;
    pantry_filter.allow_stone = false;
    pantry_filter.allow_scrap = false;
    pantry_filter.allow_metal = false;
    pantry_filter.allow_equipment = false;
    let pantry_tiles: Vec<TilePos> = (0..4).map(|i| TilePos::new(12 + i, 4, 0)).collect();
    colony
        .stockpiles
        .create_zone("pantry", pantry_tiles, pantry_filter);

    // Scatter resource nodes and something to salvage
    for _ in 0..8 {
        let pos = TilePos::new(rng.gen_range(20..46), rng.gen_range(2..30), 0);
        colony.world.spawn_node(pos, NodeKind::Tree, 12);
    }
    for _ in 0..4 {
        let pos = TilePos::new(rng.gen_range(20..46), rng.gen_range(2..30), 0);
        colony.world.spawn_node(pos, NodeKind::Rock, 9);
    }
    for _ in 0..5 {
        let pos = TilePos::new(rng.gen_range(20..46), rng.gen_range(2..30), 0);
        colony.world.spawn_node(pos, NodeKind::SalvageHeap, 12);
    }
    for _ in 0..3 {
        let pos = TilePos::new(rng.gen_range(20..46), rng.gen_range(2..30), 0);
        colony.world.spawn_node(pos, NodeKind::CropPatch, 10);
    }

    // Some starting goods on the ground for the haulers
    colony
        .world
        .map
        .drop_resource(TilePos::new(18, 10, 0), ResourceType::Wood, 12);
    colony
        .world
        .map
        .drop_resource(TilePos::new(18, 12, 0), ResourceType::Scrap, 8);
    colony
        .world
        .map
        .drop_resource(TilePos::new(18, 14, 0), ResourceType::RawFood, 10);

    // Wildlife
    for _ in 0..3 {
        let pos = TilePos::new(rng.gen_range(30..46), rng.gen_range(2..30), 0);
        let id = colony.world.spawn_animal(AnimalSpecies::Boar, pos);
        if let Some(animal) = colony.world.animal_mut(id) {
            animal.marked_for_hunt = true;
        }
    }

    // Work to do: a wall segment, workstations, and standing orders
    for y in 8..12 {
        let _ = colony.designate_construction(StructureKind::Wall, TilePos::new(2, y, 0), 2.5);
    }
    let _ = colony.designate_construction(StructureKind::Stove, TilePos::new(8, 14, 0), 3.0);
    let _ =
        colony.designate_construction(StructureKind::SalvagersBench, TilePos::new(10, 14, 0), 3.0);
    colony.craft_orders.add("cook_meal", 4);
    colony.craft_orders.add("smelt_metal", 2);
    colony.craft_orders.add("forge_scrap_knife", 1);

    // Harvest designations for the nearest few nodes
    let node_positions: Vec<TilePos> = colony.world.nodes.iter().map(|n| n.pos).collect();
    for pos in node_positions.into_iter().take(10) {
        let _ =
            scrapstead::jobs::producers::designate_harvest(&colony.world, &mut colony.registry, pos, 0);
    }

    // Colonists with varied trait weights from the generator stand-in
    for i in 0..colonists {
        let pos = TilePos::new(6 + i as i32, 20, 0);
        let mut traits = WorkerTraits::new(rng.gen_range(0.8..1.3));
        let categories = [
            JobCategory::Construction,
            JobCategory::Hauling,
            JobCategory::Crafting,
            JobCategory::Harvesting,
            JobCategory::Hunting,
        ];
        let favorite = categories[rng.gen_range(0..categories.len())];
        traits.set_bias(favorite, rng.gen_range(1.0..4.0));
        let name = format!("colonist-{}", i + 1);
        colony.spawn_agent(Agent::new(name, pos).with_traits(traits));
    }

    colony
}
