//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::OrgChartService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::GraphPolicy;
use crate::infrastructure::traits::{OrgRepository, TomlFileRepository};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Persistence backend
    pub repo: Arc<dyn OrgRepository>,
}

impl ServiceContainer {
    /// Create a new service container backed by the configured data file.
    pub fn new(settings: Settings) -> Self {
        let repo = Arc::new(TomlFileRepository::new(settings.data_file.clone()));
        Self::with_deps(settings, repo)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, repo: Arc<dyn OrgRepository>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, repo }
    }

    pub fn policy(&self) -> GraphPolicy {
        GraphPolicy {
            require_director: self.settings.require_director,
        }
    }

    /// Load the organisation chart of the configured owner.
    pub fn org_chart(&self) -> ApplicationResult<OrgChartService> {
        OrgChartService::load(
            Arc::clone(&self.repo),
            self.settings.owner.clone(),
            self.policy(),
        )
    }
}
