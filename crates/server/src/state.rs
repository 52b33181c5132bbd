use std::sync::Arc;
use vidsync_core::{Config, JobCoordinator};

/// Shared application state
pub struct AppState {
    config: Config,
    coordinator: Arc<JobCoordinator>,
}

impl AppState {
    pub fn new(config: Config, coordinator: Arc<JobCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &JobCoordinator {
        self.coordinator.as_ref()
    }
}
