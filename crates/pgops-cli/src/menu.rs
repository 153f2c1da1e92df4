//! Interactive menu.
//!
//! Prompts for parameters with dialoguer, runs the operation through the
//! [`Console`] and loops until the operator quits. Answers worth reusing are
//! kept in a [`Session`] and offered as defaults.

use std::path::PathBuf;

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use pgops_core::{
    format::default_backup_path,
    params::{
        CloneDatabase, CreateRole, CreateUser, Database, DatabaseFile, Migrate, NewMigration,
        PrivilegeChange, ResetDatabase, RunQuery,
    },
    BackupFormat, GrantScope, MigrationCommand, Privilege,
};

use crate::{cli::DEFAULT_BACKUP_DIR, console::Console};

/// Answers remembered between menu actions.
///
/// Only the menu reads this; the core never sees it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    pub last_database: Option<String>,
    pub last_migrations_dir: Option<PathBuf>,
}

impl Session {
    pub fn remember_database(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.last_database = Some(name.trim().to_string());
        }
    }

    pub fn remember_migrations_dir(&mut self, dir: PathBuf) {
        self.last_migrations_dir = Some(dir);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    ListDatabases,
    CreateDatabase,
    DropDatabase,
    Connect,
    ListTables,
    RunQuery,
    ExecuteFile,
    Backup,
    Restore,
    ListBackups,
    ExportSchema,
    Clone,
    Reset,
    ListUsers,
    CreateUser,
    CreateRole,
    Grant,
    Revoke,
    MigrateUp,
    MigrateDown,
    MigrateStatus,
    NewMigration,
    Doctor,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 24] = [
        MenuItem::ListDatabases,
        MenuItem::CreateDatabase,
        MenuItem::DropDatabase,
        MenuItem::Connect,
        MenuItem::ListTables,
        MenuItem::RunQuery,
        MenuItem::ExecuteFile,
        MenuItem::Backup,
        MenuItem::Restore,
        MenuItem::ListBackups,
        MenuItem::ExportSchema,
        MenuItem::Clone,
        MenuItem::Reset,
        MenuItem::ListUsers,
        MenuItem::CreateUser,
        MenuItem::CreateRole,
        MenuItem::Grant,
        MenuItem::Revoke,
        MenuItem::MigrateUp,
        MenuItem::MigrateDown,
        MenuItem::MigrateStatus,
        MenuItem::NewMigration,
        MenuItem::Doctor,
        MenuItem::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuItem::ListDatabases => "List databases",
            MenuItem::CreateDatabase => "Create database",
            MenuItem::DropDatabase => "Drop database",
            MenuItem::Connect => "Connect with psql",
            MenuItem::ListTables => "List tables",
            MenuItem::RunQuery => "Run SQL statement",
            MenuItem::ExecuteFile => "Execute SQL file",
            MenuItem::Backup => "Back up database",
            MenuItem::Restore => "Restore backup",
            MenuItem::ListBackups => "List backups",
            MenuItem::ExportSchema => "Export schema",
            MenuItem::Clone => "Clone database",
            MenuItem::Reset => "Reset database (drop, create, migrate)",
            MenuItem::ListUsers => "List users and roles",
            MenuItem::CreateUser => "Create user",
            MenuItem::CreateRole => "Create role",
            MenuItem::Grant => "Grant privileges",
            MenuItem::Revoke => "Revoke privileges",
            MenuItem::MigrateUp => "Migrate up",
            MenuItem::MigrateDown => "Migrate down",
            MenuItem::MigrateStatus => "Migration status",
            MenuItem::NewMigration => "New migration",
            MenuItem::Doctor => "Check tools",
            MenuItem::Quit => "Quit",
        }
    }
}

/// Runs the menu until the operator quits or presses Escape.
pub async fn run(console: &Console) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut session = Session::default();
    let labels: Vec<&str> = MenuItem::ALL.iter().map(MenuItem::label).collect();

    loop {
        let choice = Select::with_theme(&theme)
            .with_prompt("pgops")
            .items(&labels)
            .default(0)
            .interact_opt()?;
        let item = match choice {
            Some(index) => MenuItem::ALL[index],
            None => break,
        };
        if item == MenuItem::Quit {
            break;
        }

        let prompts = Prompts {
            theme: &theme,
            console,
        };
        prompts.dispatch(&mut session, item).await?;
        println!();
    }
    Ok(())
}

struct Prompts<'a> {
    theme: &'a ColorfulTheme,
    console: &'a Console,
}

impl Prompts<'_> {
    async fn dispatch(&self, session: &mut Session, item: MenuItem) -> Result<()> {
        match item {
            MenuItem::ListDatabases => {
                self.console.list_databases().await?;
            }
            MenuItem::ListUsers => {
                self.console.list_users().await?;
            }
            MenuItem::Doctor => {
                self.console.doctor().await?;
            }
            MenuItem::ListBackups => {
                let dir = self.path("Backup directory", Some(DEFAULT_BACKUP_DIR.into()))?;
                self.console.list_backups(&dir)?;
            }
            MenuItem::CreateRole => {
                let name = self.text("Role name", None)?;
                let login = self.yes_no("Allow login?", false)?;
                self.console.create_role(&CreateRole { name, login }).await?;
            }
            MenuItem::CreateUser => {
                let name = self.text("User name", None)?;
                let password = Password::with_theme(self.theme)
                    .with_prompt("Password")
                    .with_confirmation("Repeat password", "Passwords do not match")
                    .interact()?;
                let superuser = self.yes_no("Superuser?", false)?;
                let createdb = self.yes_no("Allow creating databases?", false)?;
                self.console
                    .create_user(&CreateUser {
                        name,
                        password,
                        superuser,
                        createdb,
                    })
                    .await?;
            }
            MenuItem::Grant | MenuItem::Revoke => {
                let Some(change) = self.privilege_change(session)? else {
                    return Ok(());
                };
                if item == MenuItem::Grant {
                    self.console.grant(&change).await?;
                } else {
                    self.console.revoke(&change).await?;
                }
            }
            MenuItem::MigrateUp | MenuItem::MigrateDown | MenuItem::MigrateStatus => {
                let command = match item {
                    MenuItem::MigrateUp => MigrationCommand::Up,
                    MenuItem::MigrateDown => MigrationCommand::Down,
                    _ => MigrationCommand::Status,
                };
                let params = self.migrate_params(session)?;
                self.console.migrate(command, &params).await?;
            }
            MenuItem::NewMigration => {
                let name = self.text("Migration name", None)?;
                let dir = self.migrations_dir(session)?;
                self.console
                    .new_migration(&NewMigration {
                        name,
                        migrations_dir: Some(dir),
                    })
                    .await?;
            }
            _ => self.database_action(session, item).await?,
        }
        Ok(())
    }

    async fn database_action(&self, session: &mut Session, item: MenuItem) -> Result<()> {
        let name = self.database(session, "Database")?;
        session.remember_database(&name);

        match item {
            MenuItem::CreateDatabase => {
                self.console.create_database(&Database::new(name)).await?;
            }
            MenuItem::DropDatabase => {
                if self.destructive(&format!("Drop database '{name}'? This cannot be undone"))? {
                    self.console.drop_database(&Database::new(name)).await?;
                }
            }
            MenuItem::Connect => {
                self.console.connect(&Database::new(name)).await?;
            }
            MenuItem::ListTables => {
                self.console.list_tables(&Database::new(name)).await?;
            }
            MenuItem::RunQuery => {
                let sql = self.text("SQL", None)?;
                self.console
                    .run_query(&RunQuery {
                        database: name,
                        sql,
                    })
                    .await?;
            }
            MenuItem::ExecuteFile => {
                let path = self.path("SQL file", None)?;
                self.console
                    .execute_sql_file(&DatabaseFile {
                        database: name,
                        path,
                    })
                    .await?;
            }
            MenuItem::Backup => {
                let format = self.backup_format()?;
                let suggested = default_backup_path(DEFAULT_BACKUP_DIR, &name, format);
                let path = self.path("Backup file", Some(suggested))?;
                self.console
                    .backup(&DatabaseFile {
                        database: name,
                        path,
                    })
                    .await?;
            }
            MenuItem::Restore => {
                let path = self.path("Backup file", None)?;
                let prompt = format!(
                    "Restore {} into '{name}'? Existing objects may be replaced",
                    path.display()
                );
                if self.destructive(&prompt)? {
                    self.console
                        .restore(&DatabaseFile {
                            database: name,
                            path,
                        })
                        .await?;
                }
            }
            MenuItem::ExportSchema => {
                let suggested = PathBuf::from(format!("{name}_schema.sql"));
                let path = self.path("Schema file", Some(suggested))?;
                self.console
                    .export_schema(&DatabaseFile {
                        database: name,
                        path,
                    })
                    .await?;
            }
            MenuItem::Clone => {
                let target = self.text("Target database", Some(format!("{name}_copy")))?;
                self.console
                    .clone_database(&CloneDatabase {
                        source: name,
                        target,
                    })
                    .await?;
            }
            MenuItem::Reset => {
                let dir = self.migrations_dir(session)?;
                if self.destructive(&format!("Reset database '{name}'? All data will be lost"))? {
                    self.console
                        .reset_database(&ResetDatabase {
                            name,
                            migrations_dir: Some(dir),
                        })
                        .await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn privilege_change(&self, session: &mut Session) -> Result<Option<PrivilegeChange>> {
        let role = self.text("Role", None)?;
        let database = self.database(session, "Database")?;
        session.remember_database(&database);

        let scopes = ["The database itself", "All tables in a schema"];
        let scope = match Select::with_theme(self.theme)
            .with_prompt("Applies to")
            .items(&scopes)
            .default(0)
            .interact()?
        {
            0 => GrantScope::Database,
            _ => GrantScope::AllTables {
                schema: self.text("Schema", Some("public".to_string()))?,
            },
        };

        let list = self.text("Privileges (comma-separated)", None)?;
        match Privilege::parse_list(&list) {
            Ok(privileges) => Ok(Some(PrivilegeChange {
                privileges,
                scope,
                database,
                role,
            })),
            Err(message) => {
                self.console.renderer().render(&format!("Error: {message}"))?;
                Ok(None)
            }
        }
    }

    fn migrate_params(&self, session: &mut Session) -> Result<Migrate> {
        let mut input = Input::<String>::with_theme(self.theme)
            .with_prompt("Database (empty for DATABASE_URL)")
            .allow_empty(true);
        if let Some(last) = &session.last_database {
            input = input.default(last.clone());
        }
        let database = input.interact_text()?;
        session.remember_database(&database);

        let dir = self.migrations_dir(session)?;
        Ok(Migrate {
            database: Some(database).filter(|db| !db.trim().is_empty()),
            migrations_dir: Some(dir),
        })
    }

    fn migrations_dir(&self, session: &mut Session) -> Result<PathBuf> {
        let default = self
            .console
            .ops()
            .migrations_dir(session.last_migrations_dir.as_deref());
        let dir = self.path("Migrations directory", Some(default))?;
        session.remember_migrations_dir(dir.clone());
        Ok(dir)
    }

    fn backup_format(&self) -> Result<BackupFormat> {
        let formats = [BackupFormat::PlainSql, BackupFormat::CustomArchive];
        let labels = ["Plain SQL (.sql)", "Custom archive (.dump)"];
        let index = Select::with_theme(self.theme)
            .with_prompt("Format")
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(formats[index])
    }

    fn database(&self, session: &Session, prompt: &str) -> Result<String> {
        self.text(prompt, session.last_database.clone())
    }

    fn text(&self, prompt: &str, default: Option<String>) -> Result<String> {
        let mut input = Input::<String>::with_theme(self.theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default);
        }
        Ok(input.interact_text()?)
    }

    fn path(&self, prompt: &str, default: Option<PathBuf>) -> Result<PathBuf> {
        let default = default.map(|p| p.to_string_lossy().into_owned());
        Ok(PathBuf::from(self.text(prompt, default)?))
    }

    fn yes_no(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn destructive(&self, prompt: &str) -> Result<bool> {
        let confirmed = self.yes_no(prompt, false)?;
        if !confirmed {
            self.console.renderer().render("Aborted.")?;
        }
        Ok(confirmed)
    }
}
