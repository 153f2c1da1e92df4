//! Connection configuration loaded from the process environment.

use std::path::{Path, PathBuf};

use crate::error::{OpsError, Result};

/// Default directory holding dbmate migrations.
pub const DEFAULT_MIGRATIONS_DIR: &str = "./db/migrations";

/// Default database used for server-level statements.
pub const DEFAULT_MAINTENANCE_DB: &str = "postgres";

const REQUIRED_VARS: [&str; 4] = ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASSWORD"];

/// Server address and credentials shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Executables used for each tool role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub psql: String,
    pub pg_dump: String,
    pub pg_restore: String,
    pub dbmate: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            psql: "psql".to_string(),
            pg_dump: "pg_dump".to_string(),
            pg_restore: "pg_restore".to_string(),
            dbmate: "dbmate".to_string(),
        }
    }
}

/// Complete runtime configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: ConnectionParameters,
    /// Pre-built connection string used by migrations when no database is named
    pub database_url: Option<String>,
    pub migrations_dir: PathBuf,
    pub maintenance_db: String,
    pub tools: ToolPaths,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Configuration` listing every missing required
    /// variable, or when `DB_PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(OpsError::configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let mut builder = ConfigBuilder::new()
            .host(get("DB_HOST").unwrap_or_default())
            .port(parse_port(&get("DB_PORT").unwrap_or_default())?)
            .user(get("DB_USER").unwrap_or_default())
            .password(get("DB_PASSWORD").unwrap_or_default());

        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(dir) = get("MIGRATIONS_DIR") {
            builder = builder.migrations_dir(dir);
        }
        if let Some(db) = get("PGOPS_MAINTENANCE_DB") {
            builder = builder.maintenance_db(db);
        }

        let defaults = ToolPaths::default();
        builder = builder.tools(ToolPaths {
            psql: get("PGOPS_PSQL").unwrap_or(defaults.psql),
            pg_dump: get("PGOPS_PG_DUMP").unwrap_or(defaults.pg_dump),
            pg_restore: get("PGOPS_PG_RESTORE").unwrap_or(defaults.pg_restore),
            dbmate: get("PGOPS_DBMATE").unwrap_or(defaults.dbmate),
        });

        builder.build()
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value.trim().parse::<u16>().map_err(|_| {
        OpsError::configuration(format!("DB_PORT must be a port number, got '{value}'"))
    })
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    database_url: Option<String>,
    migrations_dir: Option<PathBuf>,
    maintenance_db: Option<String>,
    tools: Option<ToolPaths>,
}

impl ConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn migrations_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.migrations_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn maintenance_db(mut self, db: impl Into<String>) -> Self {
        self.maintenance_db = Some(db.into());
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Configuration` naming every connection field that
    /// was never set or is empty.
    pub fn build(self) -> Result<Config> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        let mut missing = Vec::new();
        if !present(&self.host) {
            missing.push("host");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        if !present(&self.user) {
            missing.push("user");
        }
        if !present(&self.password) {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(OpsError::configuration(format!(
                "missing connection parameters: {}",
                missing.join(", ")
            )));
        }

        Ok(Config {
            connection: ConnectionParameters {
                host: self.host.unwrap_or_default(),
                port: self.port.unwrap_or_default(),
                user: self.user.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
            },
            database_url: self.database_url,
            migrations_dir: self
                .migrations_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_DIR)),
            maintenance_db: self
                .maintenance_db
                .unwrap_or_else(|| DEFAULT_MAINTENANCE_DB.to_string()),
            tools: self.tools.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_complete() {
        let config = Config::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.database_url, None);
        assert_eq!(config.migrations_dir, PathBuf::from("./db/migrations"));
        assert_eq!(config.maintenance_db, "postgres");
        assert_eq!(config.tools, ToolPaths::default());
    }

    #[test]
    fn test_from_lookup_lists_every_missing_variable() {
        let err = Config::from_lookup(lookup_from(&[("DB_PORT", "5432"), ("DB_PASSWORD", "")]))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: missing required environment variables: DB_HOST, DB_USER, DB_PASSWORD"
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let err = Config::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "five"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "pw"),
        ]))
        .unwrap_err();

        assert!(matches!(err, OpsError::Configuration { .. }));
        assert!(err.to_string().contains("five"));
    }

    #[test]
    fn test_from_lookup_optional_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_USER", "admin"),
            ("DB_PASSWORD", "secret"),
            ("DATABASE_URL", "postgres://u:p@h:1/app"),
            ("MIGRATIONS_DIR", "migrations"),
            ("PGOPS_PG_DUMP", "/opt/pg/bin/pg_dump"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://u:p@h:1/app")
        );
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.tools.pg_dump, "/opt/pg/bin/pg_dump");
        assert_eq!(config.tools.psql, "psql");
    }

    #[test]
    fn test_builder_requires_connection_fields() {
        let err = ConfigBuilder::new().host("localhost").build().unwrap_err();
        assert!(err.to_string().contains("port, user, password"));
    }
}
