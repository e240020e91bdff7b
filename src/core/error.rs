use thiserror::Error;

use crate::core::types::{JobId, ReservationId, ZoneId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Job not found: {0:?}")]
    JobNotFound(JobId),

    #[error("Job already claimed: {0:?}")]
    AlreadyClaimed(JobId),

    #[error("Malformed job: {0}")]
    MalformedJob(String),

    #[error("Zone not found: {0:?}")]
    ZoneNotFound(ZoneId),

    #[error("Reservation not found: {0:?}")]
    ReservationNotFound(ReservationId),

    #[error("Reservation already settled: {0:?}")]
    ReservationSettled(ReservationId),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
