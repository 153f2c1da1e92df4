//! Derives connection targets from configuration.
//!
//! Credentials are copied into connection strings and environment variables
//! verbatim. Passwords containing `@`, `/` or `:` produce URLs that dbmate
//! cannot parse; see DESIGN.md.

use crate::{
    config::{Config, ConnectionParameters},
    error::{OpsError, Result},
};

/// Resolves the connection string handed to the migration tool.
///
/// With no explicit database the pre-supplied `DATABASE_URL` override is
/// returned verbatim; otherwise a URL for `explicit_db` is built from the
/// connection parameters.
///
/// # Errors
///
/// Returns `OpsError::Configuration` when no database is named and no
/// override is configured.
///
/// # Examples
///
/// ```rust
/// # use pgops_core::{config::ConfigBuilder, connection::resolve_connection_string};
/// let config = ConfigBuilder::new()
///     .host("localhost")
///     .port(5432)
///     .user("postgres")
///     .password("pw")
///     .build()?;
/// let url = resolve_connection_string(&config, Some("app"))?;
/// assert_eq!(url, "postgres://postgres:pw@localhost:5432/app?sslmode=disable");
/// # Result::<(), pgops_core::OpsError>::Ok(())
/// ```
pub fn resolve_connection_string(config: &Config, explicit_db: Option<&str>) -> Result<String> {
    match explicit_db.map(str::trim).filter(|db| !db.is_empty()) {
        Some(db) => Ok(connection_url(&config.connection, db)),
        None => config.database_url.clone().ok_or_else(|| {
            OpsError::configuration(
                "no database name given and DATABASE_URL is not set; \
                 name a database or configure DATABASE_URL",
            )
        }),
    }
}

/// Builds a `postgres://` URL for `database`.
pub fn connection_url(params: &ConnectionParameters, database: &str) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode=disable",
        params.user, params.password, params.host, params.port, database
    )
}

/// Host, port and user flags shared by psql, pg_dump and pg_restore.
pub fn server_args(params: &ConnectionParameters) -> Vec<String> {
    vec![
        "-h".to_string(),
        params.host.clone(),
        "-p".to_string(),
        params.port.to_string(),
        "-U".to_string(),
        params.user.clone(),
    ]
}

/// Environment overlay for the PostgreSQL client tools.
///
/// The password travels through `PGPASSWORD` so it never appears in the
/// argument list, and the pager is disabled for captured output.
pub fn client_env(params: &ConnectionParameters) -> Vec<(String, String)> {
    vec![
        ("PGPASSWORD".to_string(), params.password.clone()),
        ("PAGER".to_string(), String::new()),
        ("PSQL_PAGER".to_string(), String::new()),
    ]
}
