//! Core library for the pgops PostgreSQL operator console.
//!
//! This crate turns administrative intents (create a database, back it up,
//! run migrations, ...) into invocations of the standard PostgreSQL client
//! tools and dbmate, and classifies what those tools report into a small set
//! of outcomes a front end can display.
//!
//! # Architecture
//!
//! - **Configuration** ([`config`]): connection parameters loaded from the
//!   environment, with a builder for explicit construction
//! - **Invocation** ([`invocation`]): process specs and the [`ToolRunner`]
//!   trait; [`SystemRunner`] spawns real processes
//! - **Classification** ([`classify`]): per-action stderr rules mapping tool
//!   failures to [`OperationOutcome`]s
//! - **Orchestration** ([`orchestrator`]): the operation API
//!
//! Expected conditions (an existing database, a missing backup file) are
//! outcomes. Conditions that stop an operation from running at all (bad
//! input, a missing executable, incomplete configuration) are [`OpsError`]s.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pgops_core::{params::Database, OrchestratorBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads DB_HOST, DB_PORT, DB_USER and DB_PASSWORD
//! let ops = OrchestratorBuilder::new().build()?;
//!
//! let outcome = ops.create_database(&Database::new("app")).await?;
//! println!("{outcome}");
//!
//! let report = ops
//!     .reset_database(
//!         &pgops_core::params::ResetDatabase {
//!             name: "app".to_string(),
//!             migrations_dir: None,
//!         },
//!         |step| println!("{step}"),
//!     )
//!     .await?;
//! assert_eq!(report.steps.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod connection;
pub mod error;
pub mod format;
pub mod invocation;
pub mod orchestrator;
pub mod outcome;
pub mod params;
pub mod privilege;
pub mod validate;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, ConnectionParameters, ToolPaths};
pub use error::{OpsError, Result};
pub use format::{BackupFile, BackupFormat};
pub use invocation::{
    ExitKind, InvocationResult, InvocationSpec, SystemRunner, ToolKind, ToolRunner,
};
pub use orchestrator::{
    doctor::{ToolState, ToolStatus},
    migrations::MigrationCommand,
    Orchestrator, OrchestratorBuilder,
};
pub use outcome::{CompositeReport, OperationOutcome, StepReport};
pub use privilege::{GrantScope, Privilege};
