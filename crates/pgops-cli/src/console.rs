//! Runs operations and renders their results.
//!
//! [`Console`] sits between the front ends (one-shot subcommands and the
//! interactive menu) and the orchestrator. Every method runs one operation,
//! prints its result and returns whether it ended acceptably; operation
//! errors such as a missing tool are rendered, not propagated.

use std::{
    future::Future,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use dialoguer::Confirm;
use log::debug;
use pgops_core::{
    format::{default_backup_path, list_backups},
    params::{
        CloneDatabase, CreateRole, CreateUser, Database, DatabaseFile, Migrate, NewMigration,
        PrivilegeChange, ResetDatabase, RunQuery,
    },
    CompositeReport, MigrationCommand, OperationOutcome, OpsError, Orchestrator, StepReport,
    ToolStatus,
};
use serde_json::json;

use crate::{
    cli::{DbCommands, MigrateCommands, UserCommands},
    renderer::TerminalRenderer,
};

pub struct Console {
    ops: Orchestrator,
    renderer: TerminalRenderer,
    busy: Arc<AtomicBool>,
}

impl Console {
    /// `busy` is raised while an operation runs so the interrupt handler
    /// knows whether to cancel tools or exit.
    pub fn new(ops: Orchestrator, renderer: TerminalRenderer, busy: Arc<AtomicBool>) -> Self {
        Self {
            ops,
            renderer,
            busy,
        }
    }

    pub fn ops(&self) -> &Orchestrator {
        &self.ops
    }

    pub fn renderer(&self) -> &TerminalRenderer {
        &self.renderer
    }

    // ------------------------------------------------------------------
    // Subcommand dispatch
    // ------------------------------------------------------------------

    pub async fn handle_db_command(&self, command: DbCommands) -> Result<bool> {
        match command {
            DbCommands::List => self.list_databases().await,
            DbCommands::Create(args) => self.create_database(&args.into()).await,
            DbCommands::Drop(args) => {
                let prompt = format!("Drop database '{}'? This cannot be undone", args.name);
                if !self.confirm(&prompt, args.yes)? {
                    return self.declined();
                }
                self.drop_database(&args.into()).await
            }
            DbCommands::Connect(args) => self.connect(&args.into()).await,
            DbCommands::Tables(args) => self.list_tables(&args.into()).await,
            DbCommands::Query(args) => self.run_query(&args.into()).await,
            DbCommands::Exec(args) => self.execute_sql_file(&args.into()).await,
            DbCommands::Backup(args) => {
                let path = args.path.unwrap_or_else(|| {
                    default_backup_path(&args.dir, &args.database, args.format.into())
                });
                self.backup(&DatabaseFile {
                    database: args.database,
                    path,
                })
                .await
            }
            DbCommands::Restore(args) => {
                let prompt = format!(
                    "Restore {} into '{}'? Existing objects may be replaced",
                    args.path.display(),
                    args.database
                );
                if !self.confirm(&prompt, args.yes)? {
                    return self.declined();
                }
                self.restore(&args.into()).await
            }
            DbCommands::Backups(args) => self.list_backups(&args.dir),
            DbCommands::Schema(args) => self.export_schema(&args.into()).await,
            DbCommands::Clone(args) => self.clone_database(&args.into()).await,
            DbCommands::Reset(args) => {
                let prompt = format!(
                    "Reset database '{}'? All data will be lost",
                    args.name
                );
                if !self.confirm(&prompt, args.yes)? {
                    return self.declined();
                }
                self.reset_database(&args.into()).await
            }
        }
    }

    pub async fn handle_user_command(&self, command: UserCommands) -> Result<bool> {
        match command {
            UserCommands::List => self.list_users().await,
            UserCommands::Create(args) => self.create_user(&args.into()).await,
            UserCommands::CreateRole(args) => self.create_role(&args.into()).await,
            UserCommands::Grant(args) => self.grant(&args.into()).await,
            UserCommands::Revoke(args) => self.revoke(&args.into()).await,
        }
    }

    pub async fn handle_migrate_command(&self, command: MigrateCommands) -> Result<bool> {
        match command {
            MigrateCommands::Up(args) => self.migrate(MigrationCommand::Up, &args.into()).await,
            MigrateCommands::Down(args) => {
                self.migrate(MigrationCommand::Down, &args.into()).await
            }
            MigrateCommands::Status(args) => {
                self.migrate(MigrationCommand::Status, &args.into()).await
            }
            MigrateCommands::New(args) => self.new_migration(&args.into()).await,
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    pub async fn list_databases(&self) -> Result<bool> {
        let result = self.running(self.ops.list_databases()).await;
        self.listing(result)
    }

    pub async fn create_database(&self, params: &Database) -> Result<bool> {
        let result = self.running(self.ops.create_database(params)).await;
        self.outcome(result)
    }

    pub async fn drop_database(&self, params: &Database) -> Result<bool> {
        let result = self.running(self.ops.drop_database(params)).await;
        self.outcome(result)
    }

    pub async fn connect(&self, params: &Database) -> Result<bool> {
        let result = self.running(self.ops.connect(params)).await;
        self.outcome(result)
    }

    pub async fn list_tables(&self, params: &Database) -> Result<bool> {
        let result = self.running(self.ops.list_tables(params)).await;
        self.listing(result)
    }

    pub async fn run_query(&self, params: &RunQuery) -> Result<bool> {
        let result = self.running(self.ops.run_query(params)).await;
        self.listing(result)
    }

    pub async fn execute_sql_file(&self, params: &DatabaseFile) -> Result<bool> {
        let result = self.running(self.ops.execute_sql_file(params)).await;
        self.outcome(result)
    }

    pub async fn backup(&self, params: &DatabaseFile) -> Result<bool> {
        let result = self.running(self.ops.backup(params)).await;
        self.outcome(result)
    }

    pub async fn restore(&self, params: &DatabaseFile) -> Result<bool> {
        let result = self.running(self.ops.restore(params)).await;
        self.outcome(result)
    }

    pub async fn export_schema(&self, params: &DatabaseFile) -> Result<bool> {
        let result = self.running(self.ops.export_schema(params)).await;
        self.outcome(result)
    }

    pub fn list_backups(&self, dir: &Path) -> Result<bool> {
        let files = match list_backups(dir) {
            Ok(files) => files,
            Err(e) => return self.failed(&e),
        };

        if self.renderer.is_json() {
            self.renderer.json(&serde_json::to_value(&files)?)?;
        } else if files.is_empty() {
            self.renderer
                .render(&format!("No backups found in {}", dir.display()))?;
        } else {
            let mut markdown = format!("# Backups in {}\n\n", dir.display());
            for file in &files {
                markdown.push_str(&format!("- {file}\n"));
            }
            self.renderer.render(&markdown)?;
        }
        Ok(true)
    }

    pub async fn clone_database(&self, params: &CloneDatabase) -> Result<bool> {
        self.heading(&format!("Clone {} into {}", params.source, params.target))?;
        let result = self
            .running(self.ops.clone_database(params, |step| self.progress(step)))
            .await;
        self.report(result)
    }

    pub async fn reset_database(&self, params: &ResetDatabase) -> Result<bool> {
        self.heading(&format!("Reset {}", params.name))?;
        let result = self
            .running(self.ops.reset_database(params, |step| self.progress(step)))
            .await;
        self.report(result)
    }

    pub async fn list_users(&self) -> Result<bool> {
        let result = self.running(self.ops.list_users()).await;
        self.listing(result)
    }

    pub async fn create_user(&self, params: &CreateUser) -> Result<bool> {
        let result = self.running(self.ops.create_user(params)).await;
        self.outcome(result)
    }

    pub async fn create_role(&self, params: &CreateRole) -> Result<bool> {
        let result = self.running(self.ops.create_role(params)).await;
        self.outcome(result)
    }

    pub async fn grant(&self, params: &PrivilegeChange) -> Result<bool> {
        let result = self.running(self.ops.grant(params)).await;
        self.outcome(result)
    }

    pub async fn revoke(&self, params: &PrivilegeChange) -> Result<bool> {
        let result = self.running(self.ops.revoke(params)).await;
        self.outcome(result)
    }

    pub async fn migrate(&self, command: MigrationCommand, params: &Migrate) -> Result<bool> {
        let result = self.running(self.ops.migrate(command, params)).await;
        self.outcome(result)
    }

    pub async fn new_migration(&self, params: &NewMigration) -> Result<bool> {
        let result = self.running(self.ops.new_migration(params)).await;
        self.outcome(result)
    }

    /// Reports every tool; succeeds only when all of them are usable.
    pub async fn doctor(&self) -> Result<bool> {
        let statuses = self.running(self.ops.check_tools()).await;

        if self.renderer.is_json() {
            self.renderer.json(&serde_json::to_value(&statuses)?)?;
        } else {
            let mut markdown = String::from("# Tools\n\n");
            for status in &statuses {
                markdown.push_str(&format!("- {status}\n"));
            }
            self.renderer.render(&markdown)?;
        }
        Ok(statuses.iter().all(ToolStatus::is_available))
    }

    // ------------------------------------------------------------------
    // Rendering helpers
    // ------------------------------------------------------------------

    /// Asks before a destructive action unless `assume_yes` is set.
    pub fn confirm(&self, prompt: &str, assume_yes: bool) -> Result<bool> {
        if assume_yes {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Confirmation needs a terminal; pass --yes to skip it")
    }

    fn declined(&self) -> Result<bool> {
        self.renderer.render("Aborted.")?;
        Ok(false)
    }

    async fn running<F: Future>(&self, operation: F) -> F::Output {
        self.busy.store(true, Ordering::SeqCst);
        let output = operation.await;
        self.busy.store(false, Ordering::SeqCst);
        output
    }

    fn outcome(&self, result: pgops_core::Result<OperationOutcome>) -> Result<bool> {
        match result {
            Ok(outcome) => {
                if self.renderer.is_json() {
                    self.renderer.json(&serde_json::to_value(&outcome)?)?;
                } else {
                    self.renderer.render(&outcome.to_string())?;
                }
                Ok(outcome.is_ok())
            }
            Err(e) => self.failed(&e),
        }
    }

    /// Like [`outcome`](Self::outcome), printing successful tool output as is.
    fn listing(&self, result: pgops_core::Result<OperationOutcome>) -> Result<bool> {
        match result {
            Ok(OperationOutcome::Success { detail }) if !self.renderer.is_json() => {
                self.renderer.raw(&detail);
                Ok(true)
            }
            other => self.outcome(other),
        }
    }

    fn report(&self, result: pgops_core::Result<CompositeReport>) -> Result<bool> {
        match result {
            Ok(report) => {
                if self.renderer.is_json() {
                    self.renderer.json(&serde_json::to_value(&report)?)?;
                }
                Ok(report.is_ok())
            }
            Err(e) => self.failed(&e),
        }
    }

    fn heading(&self, title: &str) -> Result<()> {
        if self.renderer.is_json() {
            return Ok(());
        }
        self.renderer.render(&format!("# {title}\n"))
    }

    /// Composite steps are printed as they finish.
    fn progress(&self, step: &StepReport) {
        if self.renderer.is_json() {
            return;
        }
        if let Err(e) = self.renderer.render(&format!("- {step}")) {
            debug!("failed to render step: {e}");
        }
    }

    fn failed(&self, error: &OpsError) -> Result<bool> {
        if self.renderer.is_json() {
            self.renderer.json(&json!({
                "outcome": "error",
                "message": error.to_string(),
            }))?;
        } else {
            self.renderer.render(&format!("Error: {error}"))?;
        }
        Ok(false)
    }
}
