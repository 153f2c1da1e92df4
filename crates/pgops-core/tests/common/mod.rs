//! Fake PostgreSQL tools for integration tests.
//!
//! Each fake is a small shell script that appends its arguments to a log file
//! and then behaves according to the body passed in.

#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use pgops_core::{Config, ConfigBuilder, ToolPaths};
use tempfile::TempDir;

/// A temporary directory holding fake tools and their argument logs.
pub struct FakeTools {
    pub dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes an executable script `name` that logs its arguments and then
    /// runs `body`.
    pub fn install(&self, name: &str, body: &str) -> PathBuf {
        let script = self.path().join(name);
        let log = self.log_path(name);
        let contents = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\n{body}\n",
            log.display()
        );
        fs::write(&script, contents).expect("Failed to write fake tool");
        let mut perms = fs::metadata(&script)
            .expect("Failed to stat fake tool")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).expect("Failed to chmod fake tool");
        script
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.path().join(format!("{name}.log"))
    }

    /// Argument lines recorded by `name`, one per invocation.
    pub fn invocations(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.log_path(name))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// A configuration pointing every tool role at a script in this directory,
    /// whether or not it has been installed.
    pub fn config(&self) -> Config {
        let program = |name: &str| self.path().join(name).to_string_lossy().into_owned();
        ConfigBuilder::new()
            .host("localhost")
            .port(5432)
            .user("postgres")
            .password("secret")
            .tools(ToolPaths {
                psql: program("psql"),
                pg_dump: program("pg_dump"),
                pg_restore: program("pg_restore"),
                dbmate: program("dbmate"),
            })
            .build()
            .expect("Failed to build config")
    }
}
