//! Single-invocation operations.
//!
//! Each operation validates its parameters, builds one psql or pg_dump
//! invocation, runs it and classifies the result. Drop is the exception: it
//! first terminates other sessions on the database, ignoring the outcome.

use log::{debug, warn};

use super::{ensure_parent_dir, Orchestrator};
use crate::{
    classify::Action,
    error::{OpsError, Result},
    invocation::{ExitKind, ToolKind, ToolRunner},
    outcome::OperationOutcome,
    params::{CreateRole, CreateUser, Database, DatabaseFile, PrivilegeChange, RunQuery},
    privilege::{GrantScope, Privilege},
    validate::{self, quote_ident, quote_literal},
};

const LIST_DATABASES_SQL: &str = "SELECT datname AS database, \
     pg_catalog.pg_get_userbyid(datdba) AS owner, \
     pg_catalog.pg_size_pretty(pg_catalog.pg_database_size(datname)) AS size \
     FROM pg_catalog.pg_database WHERE NOT datistemplate ORDER BY datname;";

impl<R: ToolRunner> Orchestrator<R> {
    /// Lists non-template databases with owner and size.
    pub async fn list_databases(&self) -> Result<OperationOutcome> {
        let spec = self.server_sql(LIST_DATABASES_SQL);
        self.query(&spec, Action::Query, "No databases found").await
    }

    /// Creates a database.
    ///
    /// Returns `AlreadyExists` when the server reports the name is taken.
    ///
    /// # Errors
    ///
    /// * `OpsError::InvalidInput` - name outside `[A-Za-z0-9_]`
    /// * `OpsError::ToolNotFound` - psql is not installed
    pub async fn create_database(&self, params: &Database) -> Result<OperationOutcome> {
        validate::identifier("database", &params.name)?;
        let spec = self.server_sql(&format!("CREATE DATABASE {};", quote_ident(&params.name)));
        self.execute(
            &spec,
            Action::CreateDatabase,
            format!("Database '{}' created", params.name),
        )
        .await
    }

    /// Drops a database if it exists, disconnecting other sessions first.
    ///
    /// Dropping a database that does not exist succeeds.
    pub async fn drop_database(&self, params: &Database) -> Result<OperationOutcome> {
        validate::identifier("database", &params.name)?;
        self.terminate_connections(&params.name).await;

        let spec = self.server_sql(&format!(
            "DROP DATABASE IF EXISTS {};",
            quote_ident(&params.name)
        ));
        self.execute(
            &spec,
            Action::DropDatabase,
            format!("Database '{}' dropped", params.name),
        )
        .await
    }

    /// Best effort: failures are logged and never stop the drop.
    async fn terminate_connections(&self, database: &str) {
        let spec = self.server_sql(&format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
             WHERE datname = {} AND pid <> pg_backend_pid();",
            quote_literal(database)
        ));
        match self.runner().run(&spec).await {
            Ok(result) if result.is_success() => {
                debug!("terminated sessions on '{database}'");
            }
            Ok(result) => warn!(
                "could not terminate sessions on '{database}': {}",
                result.stderr.trim()
            ),
            Err(e) => warn!("could not terminate sessions on '{database}': {e}"),
        }
    }

    /// Opens an interactive psql session on the caller's terminal.
    pub async fn connect(&self, params: &Database) -> Result<OperationOutcome> {
        validate::argument("database", &params.name)?;
        let spec = self.psql(Some(&params.name));
        let exit = self.runner().run_interactive(&spec).await?;
        Ok(exit_outcome(
            exit,
            format!("Session on '{}' ended", params.name),
            "psql",
        ))
    }

    /// Lists tables visible in the database's search path.
    pub async fn list_tables(&self, params: &Database) -> Result<OperationOutcome> {
        validate::argument("database", &params.name)?;
        let spec = self.sql(&params.name, "\\dt");
        self.query(
            &spec,
            Action::Query,
            &format!("No tables found in '{}'", params.name),
        )
        .await
    }

    /// Lists roles and their attributes.
    pub async fn list_users(&self) -> Result<OperationOutcome> {
        let spec = self.server_sql("\\du");
        self.query(&spec, Action::Query, "No roles found").await
    }

    /// Creates a login user with a password.
    pub async fn create_user(&self, params: &CreateUser) -> Result<OperationOutcome> {
        validate::identifier("name", &params.name)?;
        validate::require("password", &params.password)?;

        let mut sql = format!(
            "CREATE USER {} WITH PASSWORD {}",
            quote_ident(&params.name),
            quote_literal(&params.password)
        );
        if params.superuser {
            sql.push_str(" SUPERUSER");
        }
        if params.createdb {
            sql.push_str(" CREATEDB");
        }
        sql.push(';');

        let spec = self.server_sql(&sql).secret();
        self.execute(
            &spec,
            Action::CreateUser,
            format!("User '{}' created", params.name),
        )
        .await
    }

    /// Creates a role, optionally allowed to log in.
    pub async fn create_role(&self, params: &CreateRole) -> Result<OperationOutcome> {
        validate::identifier("name", &params.name)?;
        let login = if params.login { "LOGIN" } else { "NOLOGIN" };
        let spec = self.server_sql(&format!(
            "CREATE ROLE {} {login};",
            quote_ident(&params.name)
        ));
        self.execute(
            &spec,
            Action::CreateRole,
            format!("Role '{}' created", params.name),
        )
        .await
    }

    /// Grants privileges to a role.
    pub async fn grant(&self, params: &PrivilegeChange) -> Result<OperationOutcome> {
        let sql = privilege_sql("GRANT", "TO", params)?;
        let spec = self.sql(&params.database, &sql);
        self.execute(
            &spec,
            Action::Grant,
            format!("Granted {} to '{}'", privilege_list(params), params.role),
        )
        .await
    }

    /// Revokes privileges from a role.
    pub async fn revoke(&self, params: &PrivilegeChange) -> Result<OperationOutcome> {
        let sql = privilege_sql("REVOKE", "FROM", params)?;
        let spec = self.sql(&params.database, &sql);
        self.execute(
            &spec,
            Action::Revoke,
            format!("Revoked {} from '{}'", privilege_list(params), params.role),
        )
        .await
    }

    /// Runs one ad-hoc statement and returns its output.
    pub async fn run_query(&self, params: &RunQuery) -> Result<OperationOutcome> {
        validate::argument("database", &params.database)?;
        validate::require("sql", &params.sql)?;
        let spec = self.sql(&params.database, &params.sql);
        self.query(&spec, Action::Query, "Query executed").await
    }

    /// Executes an SQL script, stopping at the first error.
    pub async fn execute_sql_file(&self, params: &DatabaseFile) -> Result<OperationOutcome> {
        validate::argument("database", &params.database)?;
        if !params.path.exists() {
            return Ok(OperationOutcome::not_found(params.path.display().to_string()));
        }

        let spec = self
            .psql(Some(&params.database))
            .args(["-v", "ON_ERROR_STOP=1", "-f"])
            .arg(params.path.to_string_lossy());
        self.execute(
            &spec,
            Action::ExecuteFile,
            format!(
                "Executed {} on '{}'",
                params.path.display(),
                params.database
            ),
        )
        .await
    }

    /// Writes the schema (no data) of a database to a file.
    pub async fn export_schema(&self, params: &DatabaseFile) -> Result<OperationOutcome> {
        validate::argument("database", &params.database)?;
        ensure_parent_dir(&params.path)?;

        let spec = self
            .client(ToolKind::PgDump)
            .args(["-s", "-f"])
            .arg(params.path.to_string_lossy())
            .arg(&params.database);
        self.execute(
            &spec,
            Action::ExportSchema,
            format!(
                "Schema of '{}' written to {}",
                params.database,
                params.path.display()
            ),
        )
        .await
    }
}

/// Maps an interactive exit to an outcome.
pub(crate) fn exit_outcome(exit: ExitKind, success: String, tool: &str) -> OperationOutcome {
    if exit.is_success() {
        OperationOutcome::success(success)
    } else {
        OperationOutcome::failure(format!("{tool} failed ({exit})"))
    }
}

fn privilege_list(params: &PrivilegeChange) -> String {
    if params.privileges.contains(&Privilege::All) {
        return Privilege::All.as_sql().to_string();
    }
    params
        .privileges
        .iter()
        .map(Privilege::as_sql)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds `GRANT ... TO role` / `REVOKE ... FROM role`.
fn privilege_sql(verb: &str, preposition: &str, params: &PrivilegeChange) -> Result<String> {
    validate::identifier("database", &params.database)?;
    validate::identifier("role", &params.role)?;
    if params.privileges.is_empty() {
        return Err(OpsError::invalid_input("privileges").with_reason("must not be empty"));
    }
    if let Some(bad) = params
        .privileges
        .iter()
        .find(|p| !p.applies_to(&params.scope))
    {
        return Err(OpsError::invalid_input("privileges")
            .with_reason(format!("{bad} cannot be granted on {:?}", params.scope)));
    }

    let object = match &params.scope {
        GrantScope::Database => format!("DATABASE {}", quote_ident(&params.database)),
        GrantScope::AllTables { schema } => {
            validate::identifier("schema", schema)?;
            format!("ALL TABLES IN SCHEMA {}", quote_ident(schema))
        }
    };

    Ok(format!(
        "{verb} {} ON {object} {preposition} {};",
        privilege_list(params),
        quote_ident(&params.role)
    ))
}
