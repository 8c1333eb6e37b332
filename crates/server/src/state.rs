use std::sync::Arc;
use mediactl_core::{Config, JobRegistry, ProcessManager, RemoteDispatcher};

/// Shared application state
pub struct AppState {
    config: Config,
    manager: ProcessManager,
    registry: JobRegistry,
    dispatcher: Option<Arc<RemoteDispatcher>>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Option<Arc<RemoteDispatcher>>) -> Self {
        Self {
            manager: ProcessManager::new(config.transcode.clone()),
            registry: JobRegistry::new(),
            config,
            dispatcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &ProcessManager {
        &self.manager
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> Option<&Arc<RemoteDispatcher>> {
        self.dispatcher.as_ref()
    }
}
