//! Operation outcomes returned to the front end.

use std::fmt;

use serde::Serialize;

/// The result of one operation.
///
/// Front ends render this directly; they never re-parse tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OperationOutcome {
    Success { detail: String },
    /// The resource to be created is already there
    AlreadyExists { detail: String },
    /// A referenced file, database or role is missing
    NotFound { resource: String },
    Failure { message: String },
}

impl OperationOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self::Success {
            detail: detail.into(),
        }
    }

    pub fn already_exists(detail: impl Into<String>) -> Self {
        Self::AlreadyExists {
            detail: detail.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Success and AlreadyExists are both acceptable end states.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::AlreadyExists { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// The human-readable text carried by any variant.
    pub fn detail(&self) -> &str {
        match self {
            Self::Success { detail } | Self::AlreadyExists { detail } => detail,
            Self::NotFound { resource } => resource,
            Self::Failure { message } => message,
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { detail } => write!(f, "Success: {detail}"),
            Self::AlreadyExists { detail } => write!(f, "Already exists: {detail}"),
            Self::NotFound { resource } => write!(f, "Not found: {resource}"),
            Self::Failure { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Outcome of one step of a composite operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub outcome: OperationOutcome,
}

impl StepReport {
    pub fn new(step: impl Into<String>, outcome: OperationOutcome) -> Self {
        Self {
            step: step.into(),
            outcome,
        }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}** {}", self.step, self.outcome)
    }
}

/// Ordered step reports of a composite operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeReport {
    pub operation: String,
    pub steps: Vec<StepReport>,
}

impl CompositeReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            steps: Vec::new(),
        }
    }

    /// True when every attempted step ended acceptably.
    pub fn is_ok(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_ok())
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.steps.iter().map(|s| &s.outcome)
    }
}

impl fmt::Display for CompositeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.operation)?;
        writeln!(f)?;
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, step)?;
        }
        Ok(())
    }
}
