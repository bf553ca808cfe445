use crate::{
    contract,
    grants::GrantMode,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Model, Strategy, StrategyArgs,
};

use fabric_core::{stmt::Expr, Error, Materialization, Relation, RelationKind, Result};
use tracing::info;

impl Adapter {
    pub(crate) async fn materialize_incremental(&mut self, model: &Model) -> Result<Materialized> {
        let mut lifecycle = Lifecycle::new(&model.target, Materialization::Incremental);
        let outcome = self.incremental_steps(&mut lifecycle, model).await;
        lifecycle.settle(self, outcome).await
    }

    async fn incremental_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        model: &Model,
    ) -> Result<(Vec<Relation>, Option<u64>)> {
        let config = &model.config;
        let target = model.target.as_kind(RelationKind::Table);
        contract::ensure_stageable(
            self.capability(),
            &target,
            &model.sql,
            config.contract.enforced,
        )?;

        let strategy = Strategy::select(config.strategy(), !config.unique_key.is_empty());
        let existing = self.get_relation(&target).await?;
        lifecycle.advance(State::Staging)?;

        // A view cannot become a table in place, and a full refresh discards
        // the current rows: both rebuild from scratch.
        let existing = match existing {
            Some(existing) if existing.is_table() && !config.full_refresh => existing,
            existing => {
                let rows = self
                    .build_table(lifecycle, &target, existing.as_ref(), model)
                    .await?;
                self.apply_constraints(&target, config).await?;
                self.apply_grants(&target, &config.grants, GrantMode::Replace)
                    .await?;
                return Ok((vec![target], Some(rows)));
            }
        };

        let staged = lifecycle.own(target.as_temp(self.run_id()));
        self.drop_if_exists(&staged).await?;
        self.stage_table(lifecycle, &staged, model).await?;

        if lifecycle.state() == State::Staging {
            lifecycle.advance(State::Validating)?;
        }
        let reconciled = self
            .reconcile_schema(lifecycle, &existing, &staged, config.on_schema_change)
            .await?;
        if reconciled.rebuilt {
            self.apply_constraints(&target, config).await?;
        }

        let mut args = StrategyArgs::new(&target, &staged, reconciled.dest_columns)
            .with_unique_key(config.unique_key.columns())
            .with_predicates(config.incremental_predicates.iter().map(Expr::raw));
        args.merge_update_columns = config.merge_update_columns.clone();
        args.merge_exclude_columns = config.merge_exclude_columns.clone();

        if strategy == Strategy::Microbatch {
            let Some(event_time) = &config.event_time else {
                return Err(Error::invalid_config(format!(
                    "microbatch into {target} requires `event_time`"
                )));
            };
            args = args.with_batch_window(
                event_time,
                config.event_time_start.as_deref(),
                config.event_time_end.as_deref(),
            );
        }

        let stmts = strategy.statements(&args, self.capability())?;

        lifecycle.advance(State::Publishing)?;
        info!(
            target = %target,
            strategy = %strategy,
            statements = stmts.len(),
            "applying incremental strategy"
        );
        // The last statement is the one writing new rows.
        let rows = self.execute_all(stmts).await?.last().copied();

        self.drop_existing(&staged).await?;
        lifecycle.release(&staged);

        self.apply_grants(&target, &config.grants, GrantMode::Additive)
            .await?;

        Ok((vec![target], rows))
    }
}
