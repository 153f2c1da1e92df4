//! Maps raw invocation results to [`OperationOutcome`]s.
//!
//! The PostgreSQL client tools report errors only as text, so classification
//! is substring matching on standard error against a per-action rule table.
//! Message wording can change between PostgreSQL releases; new variants are
//! added to the table with [`RuleTable::with_rule`] without touching callers.

use crate::{
    invocation::{ExitKind, InvocationResult},
    outcome::OperationOutcome,
};

/// Administrative actions that have their own classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateDatabase,
    DropDatabase,
    CreateUser,
    CreateRole,
    Grant,
    Revoke,
    /// Any statement or listing run against a named database
    Query,
    ExecuteFile,
    Backup,
    Restore,
    ExportSchema,
    Copy,
}

/// What a matching rule turns a failed invocation into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    AlreadyExists,
    NotFound,
}

/// Matches a standard error line that contains every fragment
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub fragments: Vec<String>,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new<I, S>(fragments: I, kind: RuleKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| f.into().to_ascii_lowercase())
                .collect(),
            kind,
        }
    }

    /// The first line of `stderr` matching this rule, trimmed.
    fn matching_line<'a>(&self, stderr: &'a str) -> Option<&'a str> {
        stderr.lines().map(str::trim).find(|line| {
            let lower = line.to_ascii_lowercase();
            self.fragments.iter().all(|f| lower.contains(f.as_str()))
        })
    }
}

/// Ordered rules; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    /// Treat `ERROR:` lines as failure even on a zero exit
    sql_errors_fail: bool,
}

impl RuleTable {
    /// An empty table: zero exit is Success, anything else Failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules for `action`.
    pub fn for_action(action: Action) -> Self {
        let missing_database = || Rule::new(["database \"", "does not exist"], RuleKind::NotFound);
        match action {
            Action::CreateDatabase | Action::CreateUser | Action::CreateRole => {
                Self::new().with(Rule::new(["already exists"], RuleKind::AlreadyExists))
            }
            Action::Grant | Action::Revoke => {
                Self::new().with(Rule::new(["does not exist"], RuleKind::NotFound))
            }
            Action::Query
            | Action::ExecuteFile
            | Action::Backup
            | Action::ExportSchema => Self::new().with(missing_database()),
            // psql keeps going after a failed statement and still exits 0
            Action::Restore | Action::Copy => {
                Self::new().with(missing_database()).with_sql_errors()
            }
            Action::DropDatabase => Self::new(),
        }
    }

    /// Appends a rule.
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Downgrades a zero exit to Failure when standard error reports SQL
    /// errors.
    pub fn with_sql_errors(mut self) -> Self {
        self.sql_errors_fail = true;
        self
    }

    /// Appends a single-fragment rule.
    pub fn with_rule(self, fragment: impl Into<String>, kind: RuleKind) -> Self {
        self.with(Rule::new([fragment.into()], kind))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classifies `result`, using `success_detail` when the tool exited zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pgops_core::classify::{Action, RuleTable};
    /// # use pgops_core::invocation::InvocationResult;
    /// let rules = RuleTable::for_action(Action::CreateDatabase);
    /// let result = InvocationResult::failed(1, "ERROR:  database \"app\" already exists");
    /// assert!(rules.classify(&result, "created").is_already_exists());
    /// ```
    pub fn classify(
        &self,
        result: &InvocationResult,
        success_detail: impl Into<String>,
    ) -> OperationOutcome {
        if result.is_success() {
            if self.sql_errors_fail {
                if let Some(summary) = sql_error_summary(&result.stderr) {
                    return OperationOutcome::failure(summary);
                }
            }
            return OperationOutcome::success(success_detail);
        }
        if result.exit == ExitKind::Cancelled {
            return OperationOutcome::failure("cancelled");
        }

        let stderr = result.stderr.trim();
        let matched = self
            .rules
            .iter()
            .find_map(|rule| rule.matching_line(stderr).map(|line| (rule, line)));
        if let Some((rule, line)) = matched {
            let needle = rule.fragments.last().map(String::as_str).unwrap_or_default();
            return match rule.kind {
                RuleKind::AlreadyExists => OperationOutcome::already_exists(line),
                RuleKind::NotFound => {
                    OperationOutcome::not_found(quoted_name(line, needle).unwrap_or(line))
                }
            };
        }

        if stderr.is_empty() {
            OperationOutcome::failure(format!("command failed ({})", result.exit))
        } else {
            OperationOutcome::failure(stderr)
        }
    }
}

const MAX_REPORTED_ERRORS: usize = 3;

/// `None` when no line of `stderr` is a server error.
fn sql_error_summary(stderr: &str) -> Option<String> {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.contains("ERROR:"))
        .collect();
    if errors.is_empty() {
        return None;
    }

    let mut summary = format!(
        "finished with {} SQL error(s): {}",
        errors.len(),
        errors[..errors.len().min(MAX_REPORTED_ERRORS)].join("; ")
    );
    if errors.len() > MAX_REPORTED_ERRORS {
        summary.push_str(&format!("; and {} more", errors.len() - MAX_REPORTED_ERRORS));
    }
    Some(summary)
}

/// Extracts `app` from `... database "app" does not exist`: the last quoted
/// word before `needle`.
fn quoted_name<'a>(line: &'a str, needle: &str) -> Option<&'a str> {
    let prefix = &line[..line.to_ascii_lowercase().find(needle)?];
    let end = prefix.rfind('"')?;
    let start = prefix[..end].rfind('"')? + 1;
    Some(&prefix[start..end]).filter(|name| !name.is_empty())
}
