//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use noor_core::{NoorConfig, Result};
use noor_search::SearchService;
use noor_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: NoorConfig,
    pub store: Arc<SqliteStore>,
    pub search: SearchService<SqliteStore>,
}

impl AppState {
    pub fn new(config: NoorConfig, store: Arc<SqliteStore>) -> Self {
        let search = SearchService::new(store.clone(), config.search.clone());
        Self {
            config,
            store,
            search,
        }
    }

    /// Open the store under the configured data directory and build state around it.
    pub fn open(config: NoorConfig) -> Result<Self> {
        let store = SqliteStore::open(
            &config.data_paths.db,
            Duration::from_millis(config.busy_timeout_ms),
        )?;
        Ok(Self::new(config, Arc::new(store)))
    }
}
