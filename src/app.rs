//! App core for tabweave.
//!
//! Wires settings, the backend gateway and a surface host into a running
//! coordinator, and owns its lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::gateway::RemoteStateGateway;
use crate::host::SurfaceHost;
use crate::runtime::{CoordinatorHandle, CoordinatorRuntime};
use crate::services::clock::{Clock, SystemClock};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::ConfigError;
use crate::types::settings::CoordinatorSettings;

pub struct App {
    pub settings_engine: SettingsEngine,
    runtime: Option<CoordinatorRuntime>,
}

impl App {
    /// Loads settings from `config_path` or the platform default location.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut settings_engine = SettingsEngine::new(config_path);
        settings_engine.load()?;
        Ok(Self {
            settings_engine,
            runtime: None,
        })
    }

    /// Uses `settings` as-is without reading the config file.
    pub fn with_settings(settings: CoordinatorSettings) -> Self {
        Self {
            settings_engine: SettingsEngine::from_settings(None, settings),
            runtime: None,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        self.settings_engine.get_settings()
    }

    /// Starts the coordinator with the wall clock. A second call returns the running handle.
    pub fn startup(
        &mut self,
        gateway: Arc<dyn RemoteStateGateway>,
        host: Arc<dyn SurfaceHost>,
    ) -> CoordinatorHandle {
        self.startup_with_clock(gateway, host, Arc::new(SystemClock))
    }

    pub fn startup_with_clock(
        &mut self,
        gateway: Arc<dyn RemoteStateGateway>,
        host: Arc<dyn SurfaceHost>,
        clock: Arc<dyn Clock>,
    ) -> CoordinatorHandle {
        if let Some(runtime) = &self.runtime {
            return runtime.handle();
        }
        let coordinator = Coordinator::new(gateway, host, clock, self.settings().clone());
        let runtime = CoordinatorRuntime::start(coordinator);
        let handle = runtime.handle();
        self.runtime = Some(runtime);
        handle
    }

    pub fn handle(&self) -> Option<CoordinatorHandle> {
        self.runtime.as_ref().map(|r| r.handle())
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Disposes the coordinator: timer released, surfaces closed, task ended.
    pub async fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.dispose().await;
        }
    }
}
