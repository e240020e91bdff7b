//! Colonists: the agent model, vital needs, and the execution state machine

pub mod agent;
pub mod needs;
pub mod state;

pub use agent::{Agent, AgentState, CarriedGoods, FoodErrand, WorkerTraits};
pub use needs::Needs;
pub use state::{step, StepCtx};
