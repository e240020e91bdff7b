//! The job pool: model, registry, claim protocol, and producers

pub mod job;
pub mod producers;
pub mod registry;
pub mod scoring;

pub use job::{BlockReason, HaulCargo, HaulSource, Job, JobCategory, JobPayload, JobType};
pub use producers::{CraftOrder, CraftOrderQueue};
pub use registry::{ExpiredClaim, JobRegistry};
