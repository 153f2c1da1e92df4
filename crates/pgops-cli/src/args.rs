use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{DbCommands, MigrateCommands, UserCommands};

/// Operator console for PostgreSQL
///
/// pgops drives the standard PostgreSQL client tools (psql, pg_dump,
/// pg_restore) and dbmate to create, back up, restore, clone and migrate
/// databases. Connection details come from DB_HOST, DB_PORT, DB_USER and
/// DB_PASSWORD; the flags below override them. Run without a subcommand for
/// the interactive menu.
#[derive(Parser)]
#[command(version, about, name = "pgops")]
pub struct Args {
    /// Server host, overriding DB_HOST
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port, overriding DB_PORT
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Login role, overriding DB_USER
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Migrations directory, overriding MIGRATIONS_DIR
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the pgops CLI
///
/// - `db`: database lifecycle, queries, backups and restores
/// - `user`: roles and privileges
/// - `migrate`: dbmate migrations
/// - `doctor`: check that the external tools are installed
/// - `menu`: the interactive menu (also the default)
#[derive(Subcommand)]
pub enum Commands {
    /// Manage databases
    #[command(alias = "d")]
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Manage users, roles and privileges
    #[command(alias = "u")]
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Run dbmate migrations
    #[command(alias = "m")]
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },
    /// Check that psql, pg_dump, pg_restore and dbmate are available
    Doctor,
    /// Open the interactive menu
    Menu,
}
