use std::sync::Arc;
use stashcast_core::{Config, RefreshScheduler, ResultStore, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<ResultStore>,
    scheduler: Arc<RefreshScheduler>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<ResultStore>, scheduler: Arc<RefreshScheduler>) -> Self {
        Self {
            config,
            store,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }
}
