//! Parameter structures for pgops operations
//!
//! Plain structures shared by every front end. Interface layers (the clap
//! CLI, the interactive menu) build their own argument types and convert into
//! these with `From`, keeping framework derives out of the core.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Menu prompts   │    │  Core Params    │
//! │  (clap derives) │───▶│  (dialoguer)    │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::privilege::{GrantScope, Privilege};

/// Generic parameters for operations requiring just a database name.
///
/// Used by create, drop, connect and list-tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Parameters for copying one database into another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneDatabase {
    pub source: String,
    pub target: String,
}

/// Parameters for drop, create and migrate-up in one go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetDatabase {
    pub name: String,
    /// Defaults to the configured migrations directory
    pub migrations_dir: Option<PathBuf>,
}

/// Parameters shared by backup, restore and schema export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseFile {
    pub database: String,
    pub path: PathBuf,
}

/// Parameters for running an ad-hoc SQL statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunQuery {
    pub database: String,
    pub sql: String,
}

/// Parameters for creating a login user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub password: String,
    pub superuser: bool,
    pub createdb: bool,
}

/// Parameters for creating a role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub login: bool,
}

/// Parameters for grant and revoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivilegeChange {
    pub privileges: Vec<Privilege>,
    pub scope: GrantScope,
    pub database: String,
    pub role: String,
}

/// Parameters for dbmate up, down and status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Migrate {
    /// Falls back to `DATABASE_URL` when absent
    pub database: Option<String>,
    pub migrations_dir: Option<PathBuf>,
}

/// Parameters for creating a new migration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMigration {
    pub name: String,
    pub migrations_dir: Option<PathBuf>,
}
