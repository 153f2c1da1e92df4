//! Backup file formats and backup directory helpers.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use jiff::{Timestamp, Zoned};
use serde::Serialize;

use crate::error::{OpsError, Result};

/// Representation of a database dump, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupFormat {
    /// Plain SQL script, restored through psql
    PlainSql,
    /// Compressed pg_dump custom archive, restored through pg_restore
    CustomArchive,
}

impl BackupFormat {
    /// Detects the format from `path`'s extension, or `None` when unknown.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pgops_core::format::BackupFormat;
    /// assert_eq!(BackupFormat::detect("app.dump"), Some(BackupFormat::CustomArchive));
    /// assert_eq!(BackupFormat::detect("app.SQL"), Some(BackupFormat::PlainSql));
    /// assert_eq!(BackupFormat::detect("app.tar"), None);
    /// ```
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "sql" => Some(Self::PlainSql),
            "dump" | "backup" | "dmp" => Some(Self::CustomArchive),
            _ => None,
        }
    }

    /// Format used when writing a backup; unknown extensions get plain SQL.
    pub fn for_backup<P: AsRef<Path>>(path: P) -> Self {
        Self::detect(path).unwrap_or(Self::PlainSql)
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::PlainSql => "sql",
            Self::CustomArchive => "dump",
        }
    }
}

impl fmt::Display for BackupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainSql => write!(f, "plain SQL"),
            Self::CustomArchive => write!(f, "custom archive"),
        }
    }
}

/// Builds `<dir>/<database>_<YYYYMMDD_HHMMSS>.<ext>` from the local clock.
pub fn default_backup_path<P: AsRef<Path>>(
    dir: P,
    database: &str,
    format: BackupFormat,
) -> PathBuf {
    let stamp = Zoned::now().strftime("%Y%m%d_%H%M%S").to_string();
    dir.as_ref()
        .join(format!("{database}_{stamp}.{}", format.extension()))
}

/// A backup file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFile {
    pub path: PathBuf,
    pub format: BackupFormat,
    pub size_bytes: u64,
    pub modified: Option<Timestamp>,
}

impl fmt::Display for BackupFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} bytes",
            self.path.display(),
            self.format,
            self.size_bytes
        )?;
        if let Some(modified) = &self.modified {
            write!(f, ", {}", modified.strftime("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        write!(f, ")")
    }
}

/// Lists recognised backup files in `dir`, newest first.
///
/// A directory that does not exist yields an empty list.
///
/// # Errors
///
/// Returns `OpsError::FileSystem` when the directory cannot be read.
pub fn list_backups<P: AsRef<Path>>(dir: P) -> Result<Vec<BackupFile>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| OpsError::file_system(dir, e))?;
    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| OpsError::file_system(dir, e))?;
        let path = entry.path();
        let Some(format) = BackupFormat::detect(&path) else {
            continue;
        };
        let metadata = entry
            .metadata()
            .map_err(|e| OpsError::file_system(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        backups.push(BackupFile {
            format,
            size_bytes: metadata.len(),
            modified: metadata
                .modified()
                .ok()
                .and_then(|t| Timestamp::try_from(t).ok()),
            path,
        });
    }

    backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(backups)
}
