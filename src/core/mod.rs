//! Core types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{Result, SimError};
