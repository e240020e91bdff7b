//! Simulation layer: colony container, tick loop, events, snapshots

pub mod colony;
pub mod events;
pub mod snapshot;
pub mod tick;

pub use colony::Colony;
pub use events::SimEvent;
pub use snapshot::Snapshot;
pub use tick::{run_tick, run_ticks};
