//! Execution context shared by every stage of a build.

use std::sync::Arc;

use lp_core::config::{Config, FailurePolicy};
use lp_core::{DurationProbe, Transformer};
use lp_store::ContentStore;

use crate::scheduler::Scheduler;

/// Values stamped into manifests and the course failure policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub build_version: u32,
    pub cas_base_url: String,
    pub on_course_failure: FailurePolicy,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            build_version: 1,
            cas_base_url: String::new(),
            on_course_failure: FailurePolicy::default(),
        }
    }
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            build_version: config.manifest.build_version,
            cas_base_url: config.manifest.cas_base_url.clone(),
            on_course_failure: config.pipeline.on_course_failure,
        }
    }
}

/// Context passed to every stage.
///
/// All handles are reference counted, so a context is cheap to clone into
/// concurrently running lesson tasks.
#[derive(Clone)]
pub struct PipelineContext {
    /// Cache of stage results.
    pub store: Arc<dyn ContentStore>,
    /// Performs remux and low-quality transformations.
    pub transformer: Arc<dyn Transformer>,
    /// Measures lesson durations.
    pub probe: Arc<dyn DurationProbe>,
    /// Gate for every external invocation.
    pub scheduler: Scheduler,
    pub settings: BuildSettings,
}

impl PipelineContext {
    /// Create a context with the default scheduler and settings.
    pub fn new(
        store: Arc<dyn ContentStore>,
        transformer: Arc<dyn Transformer>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            store,
            transformer,
            probe,
            scheduler: Scheduler::default(),
            settings: BuildSettings::default(),
        }
    }

    /// Builder: replace the scheduler.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Builder: replace the build settings.
    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builder: apply scheduler capacity and settings from `config`.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_scheduler(Scheduler::new(config.pipeline.concurrency))
            .with_settings(BuildSettings::from_config(config))
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("store", &self.store.name())
            .field("transformer", &self.transformer.name())
            .field("probe", &self.probe.name())
            .field("scheduler", &self.scheduler)
            .field("settings", &self.settings)
            .finish()
    }
}
