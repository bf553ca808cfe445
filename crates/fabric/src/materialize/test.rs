use crate::{
    lifecycle::{Lifecycle, State},
    Adapter, Model, TestOutcome,
};

use fabric_core::{
    config::{Severity, StoreFailuresAs},
    err,
    stmt::{Query, Select, Statement, TestResult},
    Materialization, RelationKind, Result,
};
use tracing::info;

impl Adapter {
    /// Runs a data test: counts the rows its query returns and compares the
    /// count with the configured thresholds.
    ///
    /// `model.target` names the relation failing rows are stored in when
    /// `store_failures` is set. It only exists after a run with failures.
    pub async fn run_test(&mut self, model: &Model) -> Result<TestOutcome> {
        let mut lifecycle = Lifecycle::new(&model.target, Materialization::Test);
        let outcome = self.test_steps(&mut lifecycle, model).await;

        let settled = match &outcome {
            Ok(outcome) => Ok((outcome.relation.iter().cloned().collect(), Some(outcome.failures))),
            Err(err) => Err(err.clone()),
        };
        lifecycle.settle(self, settled).await?;

        outcome
    }

    async fn test_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        model: &Model,
    ) -> Result<TestOutcome> {
        let config = &model.config;

        lifecycle.advance(State::Staging)?;
        let counted = lifecycle.own(model.target.as_temp_view(self.run_id()));
        self.drop_if_exists(&counted).await?;
        self.execute(Statement::create_view(&counted, Query::sql(&model.sql)))
            .await?;

        lifecycle.advance(State::Validating)?;
        let result = self
            .fetch(TestResult {
                query: Select::star(&counted).with_limit(config.limit),
                warn_if: config.warn_if,
                error_if: config.error_if,
            })
            .await?;

        let failures = result
            .get(0, "failures")?
            .to_i64()
            .and_then(|failures| u64::try_from(failures).ok())
            .ok_or_else(|| err!("test {} returned no failure count", model.target))?;
        let flag = |name: &str| -> Result<bool> {
            result
                .get(0, name)?
                .to_bool()
                .ok_or_else(|| err!("test {} returned a non-boolean `{name}`", model.target))
        };
        let should_warn = flag("should_warn")?;
        let should_error = flag("should_error")? && config.severity == Severity::Error;

        lifecycle.advance(State::Publishing)?;
        let mut stored = None;
        if config.store_failures {
            let relation = match config.store_failures_as {
                StoreFailuresAs::Table => model.target.as_kind(RelationKind::Table),
                StoreFailuresAs::View => model.target.as_kind(RelationKind::View),
            };

            // Failures from an earlier run never describe this one.
            self.drop_if_exists(&relation).await?;

            if failures > 0 {
                match config.store_failures_as {
                    StoreFailuresAs::Table => {
                        self.execute(Statement::create_table_as(
                            &relation,
                            Select::star(&counted).with_limit(config.limit),
                        ))
                        .await?
                    }
                    StoreFailuresAs::View => {
                        self.execute(Statement::create_view(&relation, Query::sql(&model.sql)))
                            .await?
                    }
                };
                stored = Some(relation);
            }
        }

        self.drop_existing(&counted).await?;
        lifecycle.release(&counted);

        info!(
            test = %model.target,
            failures,
            should_warn,
            should_error,
            "test evaluated"
        );

        Ok(TestOutcome {
            failures,
            should_warn,
            should_error,
            relation: stored,
        })
    }
}
