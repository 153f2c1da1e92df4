//! dbmate integration.
//!
//! dbmate runs attached to the terminal so its progress is visible live;
//! classification therefore depends on the exit status alone.

use std::path::{Path, PathBuf};

use super::{simple::exit_outcome, Orchestrator};
use crate::{
    connection::resolve_connection_string,
    error::Result,
    invocation::{InvocationSpec, ToolKind, ToolRunner},
    outcome::OperationOutcome,
    params::{Migrate, NewMigration},
    validate,
};

/// dbmate subcommands that act on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Status,
}

impl MigrationCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationCommand::Up => "up",
            MigrationCommand::Down => "down",
            MigrationCommand::Status => "status",
        }
    }
}

impl<R: ToolRunner> Orchestrator<R> {
    /// Applies pending migrations.
    pub async fn migrate_up(&self, params: &Migrate) -> Result<OperationOutcome> {
        self.migrate(MigrationCommand::Up, params).await
    }

    /// Rolls back the most recent migration.
    pub async fn migrate_down(&self, params: &Migrate) -> Result<OperationOutcome> {
        self.migrate(MigrationCommand::Down, params).await
    }

    /// Prints applied and pending migrations.
    pub async fn migrate_status(&self, params: &Migrate) -> Result<OperationOutcome> {
        self.migrate(MigrationCommand::Status, params).await
    }

    /// Runs a dbmate subcommand against the resolved database.
    ///
    /// # Errors
    ///
    /// * `OpsError::Configuration` - no database named and no `DATABASE_URL`
    /// * `OpsError::ToolNotFound` - dbmate is not installed
    pub async fn migrate(
        &self,
        command: MigrationCommand,
        params: &Migrate,
    ) -> Result<OperationOutcome> {
        let url = resolve_connection_string(self.config(), params.database.as_deref())?;
        let spec = self
            .dbmate(params.migrations_dir.as_deref())
            .env("DATABASE_URL", url)
            .arg(command.as_str());

        let exit = self.runner().run_interactive(&spec).await?;
        Ok(exit_outcome(
            exit,
            format!("dbmate {} completed", command.as_str()),
            &format!("dbmate {}", command.as_str()),
        ))
    }

    /// Creates a new, empty migration file. No database connection is made.
    pub async fn new_migration(&self, params: &NewMigration) -> Result<OperationOutcome> {
        validate::identifier("name", &params.name)?;
        let spec = self
            .dbmate(params.migrations_dir.as_deref())
            .arg("new")
            .arg(&params.name);

        let exit = self.runner().run_interactive(&spec).await?;
        Ok(exit_outcome(
            exit,
            format!("Migration '{}' created", params.name),
            "dbmate new",
        ))
    }

    /// Migrations directory in effect for `override_dir`.
    pub fn migrations_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config().migrations_dir.clone())
    }

    fn dbmate(&self, migrations_dir: Option<&Path>) -> InvocationSpec {
        InvocationSpec::new(ToolKind::Dbmate, self.program(ToolKind::Dbmate)).env(
            "DBMATE_MIGRATIONS_DIR",
            self.migrations_dir(migrations_dir).to_string_lossy(),
        )
    }
}
