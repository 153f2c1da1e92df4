//! Format-aware backup and restore.
//!
//! The file extension decides the tool chain:
//!
//! | Extension | Backup | Restore |
//! |---|---|---|
//! | `.sql` | `pg_dump` to stdout, redirected | psql reading the file on stdin |
//! | `.dump` `.backup` `.dmp` | `pg_dump -Fc -f` | `pg_restore --clean --if-exists` |
//! | other | as `.sql` | as `.sql` |

use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;

use super::{ensure_parent_dir, Orchestrator};
use crate::{
    classify::Action,
    error::{OpsError, Result},
    format::BackupFormat,
    invocation::{ToolKind, ToolRunner},
    outcome::OperationOutcome,
    params::DatabaseFile,
    validate,
};

/// The directory holding `path`; `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Shown instead of the generic install hint when pg_restore is missing.
pub const PG_RESTORE_HINT: &str = "Custom-format archives (.dump, .backup, .dmp) can only be \
     restored with pg_restore, which ships with the PostgreSQL client tools. Install them, \
     or restore from a plain .sql backup instead.";

impl<R: ToolRunner> Orchestrator<R> {
    /// Backs up a database to `path`, overwriting any existing file.
    ///
    /// The parent directory is created when missing.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use pgops_core::{OrchestratorBuilder, params::DatabaseFile};
    /// # async {
    /// let ops = OrchestratorBuilder::new().build()?;
    /// let outcome = ops
    ///     .backup(&DatabaseFile {
    ///         database: "app".to_string(),
    ///         path: "./backups/app.dump".into(),
    ///     })
    ///     .await?;
    /// println!("{outcome}");
    /// # Result::<(), pgops_core::OpsError>::Ok(())
    /// # };
    /// ```
    pub async fn backup(&self, params: &DatabaseFile) -> Result<OperationOutcome> {
        validate::argument("database", &params.database)?;
        let format = BackupFormat::for_backup(&params.path);
        ensure_parent_dir(&params.path)?;

        info!("backing up '{}' as {format}", params.database);
        let detail = format!(
            "Backed up '{}' to {} ({format})",
            params.database,
            params.path.display()
        );

        match format {
            BackupFormat::CustomArchive => {
                let spec = self
                    .client(ToolKind::PgDump)
                    .args(["-Fc", "-f"])
                    .arg(params.path.to_string_lossy())
                    .arg(&params.database);
                self.execute(&spec, Action::Backup, detail).await
            }
            BackupFormat::PlainSql => {
                // Dump next to the target; an existing backup is replaced only
                // by a dump that finished.
                let partial = NamedTempFile::new_in(parent_dir(&params.path))
                    .map_err(|e| OpsError::file_system(&params.path, e))?;
                let spec = self
                    .client(ToolKind::PgDump)
                    .arg(&params.database)
                    .stdout_file(partial.path());
                let outcome = self.execute(&spec, Action::Backup, detail).await?;
                if outcome.is_success() {
                    partial
                        .persist(&params.path)
                        .map_err(|e| OpsError::file_system(&params.path, e.error))?;
                } else {
                    debug!("discarding partial dump {}", partial.path().display());
                }
                Ok(outcome)
            }
        }
    }

    /// Restores `path` into an existing database.
    ///
    /// Returns `NotFound` without running anything when the file is missing.
    /// A plain SQL restore that printed `ERROR:` lines is a Failure even when
    /// psql exits 0.
    ///
    /// # Errors
    ///
    /// * `OpsError::ToolNotFound` - the restore tool is missing; for custom
    ///   archives the hint is [`PG_RESTORE_HINT`]
    pub async fn restore(&self, params: &DatabaseFile) -> Result<OperationOutcome> {
        validate::argument("database", &params.database)?;
        if !params.path.exists() {
            return Ok(OperationOutcome::not_found(params.path.display().to_string()));
        }

        let detail = format!(
            "Restored {} into '{}'",
            params.path.display(),
            params.database
        );

        match BackupFormat::detect(&params.path) {
            Some(BackupFormat::CustomArchive) => {
                let spec = self
                    .client(ToolKind::PgRestore)
                    .arg("-d")
                    .arg(&params.database)
                    .args(["--clean", "--if-exists", "--no-owner", "--no-acl"])
                    .arg(params.path.to_string_lossy());
                self.execute(&spec, Action::Restore, detail)
                    .await
                    .map_err(|e| match e {
                        OpsError::ToolNotFound { tool, .. } => OpsError::ToolNotFound {
                            tool,
                            hint: PG_RESTORE_HINT.to_string(),
                        },
                        other => other,
                    })
            }
            format => {
                if format.is_none() {
                    debug!(
                        "unknown backup extension for {}, restoring as SQL",
                        params.path.display()
                    );
                }
                let spec = self
                    .psql(Some(&params.database))
                    .stdin_file(&params.path);
                self.execute(&spec, Action::Restore, detail).await
            }
        }
    }
}
