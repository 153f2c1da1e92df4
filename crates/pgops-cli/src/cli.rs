//! Command-line argument definitions using clap
//!
//! Each subcommand has its own clap argument struct that converts into the
//! matching core parameter type with `From`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Orchestrator
//! ```
//!
//! The core parameter types stay free of clap derives so the interactive menu
//! can build the same values from prompts.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use pgops_core::{
    params::{
        CloneDatabase, CreateRole, CreateUser, Database, DatabaseFile, Migrate, NewMigration,
        PrivilegeChange, ResetDatabase, RunQuery,
    },
    BackupFormat, GrantScope, Privilege,
};

/// Default directory for generated backup file names.
pub const DEFAULT_BACKUP_DIR: &str = "./backups";

// ============================================================================
// Database commands
// ============================================================================

/// A command that needs only a database name
#[derive(Args)]
pub struct DatabaseArgs {
    /// Name of the database
    pub name: String,
}

impl From<DatabaseArgs> for Database {
    fn from(val: DatabaseArgs) -> Self {
        Database { name: val.name }
    }
}

/// Drop a database
#[derive(Args)]
pub struct DropDatabaseArgs {
    /// Name of the database to drop
    pub name: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl From<DropDatabaseArgs> for Database {
    fn from(val: DropDatabaseArgs) -> Self {
        Database { name: val.name }
    }
}

/// Run one SQL statement
#[derive(Args)]
pub struct QueryArgs {
    /// Database to run the statement against
    pub database: String,
    /// SQL statement
    pub sql: String,
}

impl From<QueryArgs> for RunQuery {
    fn from(val: QueryArgs) -> Self {
        RunQuery {
            database: val.database,
            sql: val.sql,
        }
    }
}

/// A command reading or writing one file for a database
#[derive(Args)]
pub struct DatabaseFileArgs {
    /// Name of the database
    pub database: String,
    /// Path of the file
    pub path: PathBuf,
}

impl From<DatabaseFileArgs> for DatabaseFile {
    fn from(val: DatabaseFileArgs) -> Self {
        DatabaseFile {
            database: val.database,
            path: val.path,
        }
    }
}

/// Command-line representation of backup formats
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum BackupFormatArg {
    /// Plain SQL script (.sql)
    Plain,
    /// pg_dump custom archive (.dump)
    Custom,
}

impl From<BackupFormatArg> for BackupFormat {
    fn from(val: BackupFormatArg) -> Self {
        match val {
            BackupFormatArg::Plain => BackupFormat::PlainSql,
            BackupFormatArg::Custom => BackupFormat::CustomArchive,
        }
    }
}

/// Back up a database
///
/// Without a path the file is named `<database>_<timestamp>.<ext>` inside
/// `--dir`.
#[derive(Args)]
pub struct BackupArgs {
    /// Name of the database
    pub database: String,
    /// Backup file; `.dump`, `.backup` and `.dmp` produce custom archives
    pub path: Option<PathBuf>,
    /// Directory for generated file names
    #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
    pub dir: PathBuf,
    /// Format for generated file names
    #[arg(long, value_enum, default_value_t = BackupFormatArg::Plain)]
    pub format: BackupFormatArg,
}

/// Restore a backup into an existing database
#[derive(Args)]
pub struct RestoreArgs {
    /// Name of the target database
    pub database: String,
    /// Backup file to restore
    pub path: PathBuf,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl From<RestoreArgs> for DatabaseFile {
    fn from(val: RestoreArgs) -> Self {
        DatabaseFile {
            database: val.database,
            path: val.path,
        }
    }
}

/// List backup files in a directory
#[derive(Args)]
pub struct ListBackupsArgs {
    /// Directory to scan
    #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
    pub dir: PathBuf,
}

/// Copy one database into another
#[derive(Args)]
pub struct CloneArgs {
    /// Database to copy from
    pub source: String,
    /// Database to create and copy into
    pub target: String,
}

impl From<CloneArgs> for CloneDatabase {
    fn from(val: CloneArgs) -> Self {
        CloneDatabase {
            source: val.source,
            target: val.target,
        }
    }
}

/// Drop, recreate and migrate a database
#[derive(Args)]
pub struct ResetArgs {
    /// Name of the database
    pub name: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl From<ResetArgs> for ResetDatabase {
    fn from(val: ResetArgs) -> Self {
        ResetDatabase {
            name: val.name,
            migrations_dir: None,
        }
    }
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// List databases with owner and size
    #[command(aliases = ["l", "ls"])]
    List,
    /// Create a database
    #[command(alias = "c")]
    Create(DatabaseArgs),
    /// Drop a database, disconnecting its sessions
    #[command(alias = "rm")]
    Drop(DropDatabaseArgs),
    /// Open an interactive psql session
    Connect(DatabaseArgs),
    /// List tables in a database
    Tables(DatabaseArgs),
    /// Run one SQL statement
    #[command(alias = "q")]
    Query(QueryArgs),
    /// Execute an SQL script, stopping at the first error
    Exec(DatabaseFileArgs),
    /// Back up a database
    #[command(alias = "b")]
    Backup(BackupArgs),
    /// Restore a backup into an existing database
    #[command(alias = "r")]
    Restore(RestoreArgs),
    /// List backup files
    Backups(ListBackupsArgs),
    /// Write a database's schema to a file
    Schema(DatabaseFileArgs),
    /// Copy one database into another
    Clone(CloneArgs),
    /// Drop, recreate and migrate a database
    Reset(ResetArgs),
}

// ============================================================================
// User commands
// ============================================================================

/// Create a login user
#[derive(Args)]
pub struct CreateUserArgs {
    /// Name of the user
    pub name: String,
    /// Password for the user
    #[arg(long, env = "PGOPS_USER_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Grant SUPERUSER
    #[arg(long)]
    pub superuser: bool,
    /// Grant CREATEDB
    #[arg(long)]
    pub createdb: bool,
}

impl From<CreateUserArgs> for CreateUser {
    fn from(val: CreateUserArgs) -> Self {
        CreateUser {
            name: val.name,
            password: val.password,
            superuser: val.superuser,
            createdb: val.createdb,
        }
    }
}

/// Create a role
#[derive(Args)]
pub struct CreateRoleArgs {
    /// Name of the role
    pub name: String,
    /// Allow the role to log in
    #[arg(long)]
    pub login: bool,
}

impl From<CreateRoleArgs> for CreateRole {
    fn from(val: CreateRoleArgs) -> Self {
        CreateRole {
            name: val.name,
            login: val.login,
        }
    }
}

/// Grant or revoke privileges
///
/// Without `--schema` the privileges apply to the database itself; with it,
/// to every table in that schema.
#[derive(Args)]
pub struct PrivilegeArgs {
    /// Role receiving or losing the privileges
    pub role: String,
    /// Database the privileges apply to
    pub database: String,
    /// Privileges as a comma-separated list (e.g. select,insert)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub privileges: Vec<Privilege>,
    /// Apply to all tables in this schema instead of the database
    #[arg(long)]
    pub schema: Option<String>,
}

impl From<PrivilegeArgs> for PrivilegeChange {
    fn from(val: PrivilegeArgs) -> Self {
        PrivilegeChange {
            privileges: val.privileges,
            scope: match val.schema {
                Some(schema) => GrantScope::AllTables { schema },
                None => GrantScope::Database,
            },
            database: val.database,
            role: val.role,
        }
    }
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List roles
    #[command(aliases = ["l", "ls"])]
    List,
    /// Create a login user
    #[command(alias = "c")]
    Create(CreateUserArgs),
    /// Create a role
    CreateRole(CreateRoleArgs),
    /// Grant privileges to a role
    Grant(PrivilegeArgs),
    /// Revoke privileges from a role
    Revoke(PrivilegeArgs),
}

// ============================================================================
// Migration commands
// ============================================================================

/// Select the database to migrate
#[derive(Args)]
pub struct MigrateArgs {
    /// Database to migrate; DATABASE_URL is used when omitted
    pub database: Option<String>,
}

impl From<MigrateArgs> for Migrate {
    fn from(val: MigrateArgs) -> Self {
        Migrate {
            database: val.database,
            migrations_dir: None,
        }
    }
}

/// Create a new migration file
#[derive(Args)]
pub struct NewMigrationArgs {
    /// Migration name, e.g. add_users_table
    pub name: String,
}

impl From<NewMigrationArgs> for NewMigration {
    fn from(val: NewMigrationArgs) -> Self {
        NewMigration {
            name: val.name,
            migrations_dir: None,
        }
    }
}

#[derive(Subcommand)]
pub enum MigrateCommands {
    /// Apply pending migrations
    Up(MigrateArgs),
    /// Roll back the most recent migration
    Down(MigrateArgs),
    /// Show applied and pending migrations
    Status(MigrateArgs),
    /// Create a new migration file
    New(NewMigrationArgs),
}
