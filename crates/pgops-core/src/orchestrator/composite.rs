//! Multi-step operations.
//!
//! Neither operation is atomic. Completed steps are never rolled back; each
//! step is reported through the `on_step` callback as soon as it finishes and
//! collected into the returned [`CompositeReport`].

use log::info;

use super::Orchestrator;
use crate::{
    classify::{Action, RuleTable},
    error::{OpsError, Result},
    invocation::{ToolKind, ToolRunner},
    outcome::{CompositeReport, OperationOutcome, StepReport},
    params::{CloneDatabase, Database, Migrate, ResetDatabase},
    validate,
};

impl<R: ToolRunner> Orchestrator<R> {
    /// Copies `source` into `target`.
    ///
    /// 1. create `target`; an existing target is fine, any other failure
    ///    stops the clone
    /// 2. stream `pg_dump source` straight into `psql -d target`
    ///
    /// A failed copy leaves `target` partially populated.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::InvalidInput` for unsafe or identical names; nothing
    /// is run in that case.
    pub async fn clone_database<F>(
        &self,
        params: &CloneDatabase,
        mut on_step: F,
    ) -> Result<CompositeReport>
    where
        F: FnMut(&StepReport),
    {
        validate::identifier("source", &params.source)?;
        validate::identifier("target", &params.target)?;
        if params.source == params.target {
            return Err(OpsError::invalid_input("target")
                .with_reason("must differ from the source database"));
        }

        let mut report = CompositeReport::new(format!(
            "Clone {} into {}",
            params.source, params.target
        ));

        let created = step_outcome(
            self.create_database(&Database::new(&params.target)).await,
        );
        let proceed = created.is_ok();
        record(&mut report, &mut on_step, "create target", created);
        if !proceed {
            info!("clone aborted: could not create '{}'", params.target);
            return Ok(report);
        }

        let producer = self.client(ToolKind::PgDump).arg(&params.source);
        let consumer = self.psql(Some(&params.target));
        let copied = match self.runner().pipe(&producer, &consumer).await {
            Ok(result) => RuleTable::for_action(Action::Copy).classify(
                &result,
                format!("Copied '{}' into '{}'", params.source, params.target),
            ),
            Err(e) => OperationOutcome::failure(e.to_string()),
        };
        record(&mut report, &mut on_step, "copy data", copied);

        Ok(report)
    }

    /// Drops, recreates and migrates a database.
    ///
    /// All three steps are always attempted, whatever the earlier ones
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::InvalidInput` for an unsafe name; nothing is run in
    /// that case.
    pub async fn reset_database<F>(
        &self,
        params: &ResetDatabase,
        mut on_step: F,
    ) -> Result<CompositeReport>
    where
        F: FnMut(&StepReport),
    {
        validate::identifier("database", &params.name)?;
        let database = Database::new(&params.name);
        let mut report = CompositeReport::new(format!("Reset {}", params.name));

        let dropped = step_outcome(self.drop_database(&database).await);
        record(&mut report, &mut on_step, "drop", dropped);

        let created = step_outcome(self.create_database(&database).await);
        record(&mut report, &mut on_step, "create", created);

        let migrated = step_outcome(
            self.migrate_up(&Migrate {
                database: Some(params.name.clone()),
                migrations_dir: params.migrations_dir.clone(),
            })
            .await,
        );
        record(&mut report, &mut on_step, "migrate up", migrated);

        Ok(report)
    }
}

/// A step that could not run at all is a failed step.
fn step_outcome(result: Result<OperationOutcome>) -> OperationOutcome {
    result.unwrap_or_else(|e| OperationOutcome::failure(e.to_string()))
}

fn record<F>(report: &mut CompositeReport, on_step: &mut F, step: &str, outcome: OperationOutcome)
where
    F: FnMut(&StepReport),
{
    info!("{}: {step} -> {outcome}", report.operation);
    let step = StepReport::new(step, outcome);
    on_step(&step);
    report.steps.push(step);
}
