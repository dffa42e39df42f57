use crate::database::repositories::Repositories;
use crate::services::media::MediaStorage;

/// Shared per-process handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Repositories,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(db: Repositories, media: MediaStorage) -> Self {
        Self { db, media }
    }
}
