//! Privilege keywords accepted by grant and revoke.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// SQL privilege keywords. Only these ever reach a GRANT/REVOKE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    All,
    Connect,
    Create,
    Temporary,
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    References,
    Trigger,
}

impl FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "all privileges" => Ok(Privilege::All),
            "connect" => Ok(Privilege::Connect),
            "create" => Ok(Privilege::Create),
            "temporary" | "temp" => Ok(Privilege::Temporary),
            "select" => Ok(Privilege::Select),
            "insert" => Ok(Privilege::Insert),
            "update" => Ok(Privilege::Update),
            "delete" => Ok(Privilege::Delete),
            "truncate" => Ok(Privilege::Truncate),
            "references" => Ok(Privilege::References),
            "trigger" => Ok(Privilege::Trigger),
            _ => Err(format!("Invalid privilege: {s}")),
        }
    }
}

impl Privilege {
    /// SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Privilege::All => "ALL PRIVILEGES",
            Privilege::Connect => "CONNECT",
            Privilege::Create => "CREATE",
            Privilege::Temporary => "TEMPORARY",
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Truncate => "TRUNCATE",
            Privilege::References => "REFERENCES",
            Privilege::Trigger => "TRIGGER",
        }
    }

    /// Whether the privilege can be granted on `scope`.
    pub fn applies_to(&self, scope: &GrantScope) -> bool {
        match (self, scope) {
            (Privilege::All, _) => true,
            (Privilege::Connect | Privilege::Create | Privilege::Temporary, GrantScope::Database) => {
                true
            }
            (
                Privilege::Select
                | Privilege::Insert
                | Privilege::Update
                | Privilege::Delete
                | Privilege::Truncate
                | Privilege::References
                | Privilege::Trigger,
                GrantScope::AllTables { .. },
            ) => true,
            _ => false,
        }
    }

    /// Parses a comma-separated list such as `select,insert`.
    pub fn parse_list(list: &str) -> Result<Vec<Privilege>, String> {
        list.split(',')
            .filter(|p| !p.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Object a privilege change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantScope {
    /// The database itself (CONNECT, CREATE, TEMPORARY)
    Database,
    /// Every table in one schema of the database
    AllTables { schema: String },
}
