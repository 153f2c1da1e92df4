//! High-level operation API.
//!
//! [`Orchestrator`] turns an administrative intent into one or more external
//! tool invocations and classifies what the tools report:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   connection    │    │   ToolRunner    │    │    RuleTable    │
//! │  (args, env,    │───▶│ (spawn, capture │───▶│  (stderr text → │
//! │   URLs)         │    │  or inherit)    │    │   outcome)      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: factory wiring configuration and a [`SystemRunner`]
//! - [`simple`]: single-invocation operations (create, drop, grant, ...)
//! - [`backup`]: format-aware backup and restore
//! - [`composite`]: clone and reset
//! - [`migrations`]: dbmate up, down, status and new
//! - [`doctor`]: tool availability checks
//!
//! The orchestrator holds no state between calls besides its configuration
//! and runner. Every operation waits for its processes to exit before
//! returning; operations are not meant to run concurrently.

use std::path::Path;

use log::debug;

use crate::{
    classify::{Action, RuleTable},
    config::Config,
    connection::{client_env, server_args},
    error::{OpsError, Result},
    invocation::{InvocationSpec, SystemRunner, ToolKind, ToolRunner},
    outcome::OperationOutcome,
};

pub mod backup;
pub mod builder;
pub mod composite;
pub mod doctor;
pub mod migrations;
pub mod simple;

#[cfg(test)]
mod tests;

pub use builder::OrchestratorBuilder;

/// Runs administrative operations through a [`ToolRunner`].
pub struct Orchestrator<R = SystemRunner> {
    config: Config,
    runner: R,
}

impl<R: ToolRunner> Orchestrator<R> {
    /// Creates an orchestrator over an explicit runner.
    pub fn new(config: Config, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Configured executable for `tool`.
    pub(crate) fn program(&self, tool: ToolKind) -> &str {
        let tools = &self.config.tools;
        match tool {
            ToolKind::Psql => &tools.psql,
            ToolKind::PgDump => &tools.pg_dump,
            ToolKind::PgRestore => &tools.pg_restore,
            ToolKind::Dbmate => &tools.dbmate,
        }
    }

    /// A PostgreSQL client tool with host, port, user and password applied.
    pub(crate) fn client(&self, tool: ToolKind) -> InvocationSpec {
        InvocationSpec::new(tool, self.program(tool))
            .args(server_args(&self.config.connection))
            .envs(client_env(&self.config.connection))
    }

    /// psql against `database`, or the server default when `None`.
    pub(crate) fn psql(&self, database: Option<&str>) -> InvocationSpec {
        let spec = self.client(ToolKind::Psql);
        match database {
            Some(db) => spec.arg("-d").arg(db),
            None => spec,
        }
    }

    /// psql running one statement with `-c`.
    pub(crate) fn sql(&self, database: &str, sql: &str) -> InvocationSpec {
        self.psql(Some(database)).arg("-c").arg(sql)
    }

    /// Statement against the maintenance database.
    pub(crate) fn server_sql(&self, sql: &str) -> InvocationSpec {
        self.sql(&self.config.maintenance_db, sql)
    }

    /// Runs a captured invocation and classifies it with `action`'s rules.
    pub(crate) async fn execute(
        &self,
        spec: &InvocationSpec,
        action: Action,
        success_detail: impl Into<String>,
    ) -> Result<OperationOutcome> {
        let result = self.runner.run(spec).await?;
        let outcome = RuleTable::for_action(action).classify(&result, success_detail);
        debug!("{:?} -> {:?}", action, outcome);
        Ok(outcome)
    }

    /// Like [`execute`](Self::execute), reporting captured output on success.
    pub(crate) async fn query(
        &self,
        spec: &InvocationSpec,
        action: Action,
        fallback: &str,
    ) -> Result<OperationOutcome> {
        let result = self.runner.run(spec).await?;
        let detail = output_or(&result.stdout, fallback);
        Ok(RuleTable::for_action(action).classify(&result, detail))
    }
}

/// Creates the parent directory of `path` when it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            debug!("creating directory {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| OpsError::file_system(parent, e))
        }
        _ => Ok(()),
    }
}

/// Captured standard output, or `fallback` when the tool printed nothing.
pub(crate) fn output_or(stdout: &str, fallback: impl Into<String>) -> String {
    let trimmed = stdout.trim_end();
    if trimmed.trim().is_empty() {
        fallback.into()
    } else {
        trimmed.to_string()
    }
}
