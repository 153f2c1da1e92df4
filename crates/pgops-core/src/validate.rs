//! Input validation and SQL quoting for names that reach a command line.

use crate::error::{OpsError, Result};

/// Checks that a required text parameter is non-empty.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OpsError::invalid_input(field).with_reason("must not be empty"));
    }
    Ok(())
}

/// Restricts a name to letters, digits and underscores.
///
/// Used for every name that is created, dropped or cloned.
///
/// # Examples
///
/// ```rust
/// # use pgops_core::validate::identifier;
/// assert!(identifier("database", "app_test_1").is_ok());
/// assert!(identifier("database", "app; DROP TABLE x").is_err());
/// ```
pub fn identifier(field: &str, value: &str) -> Result<()> {
    require(field, value)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(OpsError::invalid_input(field).with_reason(format!(
            "'{value}' may only contain letters, digits and underscores"
        )));
    }
    Ok(())
}

/// Checks a free-form name that is only passed as a discrete argument.
///
/// A leading `-` would be read as an option by the tool.
pub fn argument(field: &str, value: &str) -> Result<()> {
    require(field, value)?;
    if value.starts_with('-') {
        return Err(OpsError::invalid_input(field).with_reason(format!(
            "'{value}' must not start with '-'"
        )));
    }
    Ok(())
}

/// Quotes an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes an SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
