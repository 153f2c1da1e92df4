//! Tool availability checks.

use std::fmt;

use serde::Serialize;

use super::Orchestrator;
use crate::{
    error::OpsError,
    invocation::{InvocationSpec, ToolKind, ToolRunner},
};

/// What `--version` revealed about a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ToolState {
    Available { version: String },
    Missing { hint: String },
    /// Present but `--version` failed
    Broken { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub tool: &'static str,
    pub program: String,
    #[serde(flatten)]
    pub state: ToolState,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self.state, ToolState::Available { .. })
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            ToolState::Available { version } => {
                write!(f, "**{}** ({}): {version}", self.tool, self.program)
            }
            ToolState::Missing { hint } => {
                write!(f, "**{}** ({}): not found. {hint}", self.tool, self.program)
            }
            ToolState::Broken { message } => {
                write!(f, "**{}** ({}): {message}", self.tool, self.program)
            }
        }
    }
}

impl<R: ToolRunner> Orchestrator<R> {
    /// Probes every configured tool with `--version`.
    ///
    /// Never fails; problems are reported per tool.
    pub async fn check_tools(&self) -> Vec<ToolStatus> {
        let mut statuses = Vec::with_capacity(ToolKind::ALL.len());
        for tool in ToolKind::ALL {
            let program = self.program(tool).to_string();
            let spec = InvocationSpec::new(tool, program.clone()).arg("--version");
            let state = match self.runner().run(&spec).await {
                Ok(result) if result.is_success() => ToolState::Available {
                    version: first_line(&result.stdout),
                },
                Ok(result) => ToolState::Broken {
                    message: format!("--version failed ({}): {}", result.exit, result.stderr.trim()),
                },
                Err(OpsError::ToolNotFound { hint, .. }) => ToolState::Missing { hint },
                Err(e) => ToolState::Broken {
                    message: e.to_string(),
                },
            };
            statuses.push(ToolStatus {
                tool: tool.default_program(),
                program,
                state,
            });
        }
        statuses
    }
}

fn first_line(output: &str) -> String {
    output.lines().next().unwrap_or_default().trim().to_string()
}
