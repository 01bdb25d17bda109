use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::content::{schema::MaintenanceRecord, ContentError, Section};
use crate::error::ApiError;
use crate::store::{ContentStore, MemoryContentStore};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, verifier: TokenVerifier) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
        }
    }

    /// Fresh in-memory store seeded with defaults.
    pub fn in_memory(verifier: TokenVerifier) -> Self {
        Self::new(Arc::new(MemoryContentStore::new()), verifier)
    }

    pub async fn maintenance_record(&self) -> Result<MaintenanceRecord, ApiError> {
        let value = self.store.section(Section::Maintenance).await?;
        serde_json::from_value(value).map_err(|_| ContentError::Corrupt(Section::Maintenance).into())
    }
}
