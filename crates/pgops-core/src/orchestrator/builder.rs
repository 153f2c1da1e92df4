//! Builder for creating and configuring Orchestrator instances.

use std::sync::Arc;

use tokio::sync::Notify;

use super::Orchestrator;
use crate::{
    config::Config,
    error::Result,
    invocation::{SystemRunner, ToolRunner},
};

/// Builder for creating and configuring Orchestrator instances.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorBuilder {
    config: Option<Config>,
    cancel: Option<Arc<Notify>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit configuration instead of the process environment.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Kills running captured invocations whenever `signal` is notified.
    pub fn with_cancellation(mut self, signal: Arc<Notify>) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Builds an orchestrator that spawns real processes.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Configuration` when no configuration was supplied
    /// and the environment is incomplete.
    pub fn build(self) -> Result<Orchestrator<SystemRunner>> {
        let mut runner = SystemRunner::new();
        if let Some(signal) = &self.cancel {
            runner = runner.with_cancellation(Arc::clone(signal));
        }
        self.build_with_runner(runner)
    }

    /// Builds an orchestrator over a caller-supplied runner.
    pub fn build_with_runner<R: ToolRunner>(self, runner: R) -> Result<Orchestrator<R>> {
        let config = match self.config {
            Some(config) => config,
            None => Config::from_env()?,
        };
        Ok(Orchestrator::new(config, runner))
    }
}
