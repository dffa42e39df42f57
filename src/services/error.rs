use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::services::media::MediaError;

/// Domain failures raised by the multi-step services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Media(#[from] MediaError),
}
