mod incremental;
mod seed;
mod snapshot;
mod table;
mod test;
mod view;

use crate::{
    contract,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Model,
};

use fabric_core::{
    stmt::{Query, Select, Statement},
    Error, Materialization, Relation, Result,
};

impl Adapter {
    /// Materializes a model the way its configuration asks for.
    ///
    /// Seeds and tests produce different results and have their own entry
    /// points, [`Adapter::load_seed`] and [`Adapter::run_test`].
    pub async fn materialize(&mut self, model: &Model) -> Result<Materialized> {
        match model.config.materialized {
            Materialization::Table => self.materialize_table(model).await,
            Materialization::View => self.materialize_view(model).await,
            Materialization::Incremental => self.materialize_incremental(model).await,
            Materialization::Snapshot => self.materialize_snapshot(model).await,
            Materialization::Ephemeral => Ok(Materialized {
                relations: vec![],
                history: vec![],
                rows_affected: None,
            }),
            Materialization::Seed => Err(Error::invalid_config(format!(
                "{} is a seed; load it with `load_seed`",
                model.target
            ))),
            Materialization::Test => Err(Error::invalid_config(format!(
                "{} is a test; run it with `run_test`",
                model.target
            ))),
        }
    }

    /// Creates `relation` as a table holding the model's rows.
    ///
    /// With an enforced contract the query is staged behind a view, its
    /// columns are checked against the contract, and the rows are inserted
    /// into a table declared from the contract through an explicit column
    /// list. Without one, the query feeds `CREATE TABLE AS` directly, or
    /// through a view where the warehouse cannot nest CTEs.
    async fn stage_table(
        &mut self,
        lifecycle: &mut Lifecycle,
        relation: &Relation,
        model: &Model,
    ) -> Result<u64> {
        let config = &model.config;

        if !config.contract.enforced && !self.capability().view_indirection_for_cte {
            return self
                .execute(Statement::create_table_as(relation, Query::sql(&model.sql)))
                .await;
        }

        let view = lifecycle.own(relation.as_temp_view(self.run_id()));
        self.drop_if_exists(&view).await?;
        self.execute(Statement::create_view(&view, Query::sql(&model.sql)))
            .await?;

        let rows = if config.contract.enforced {
            let declared = config.contract_columns()?;

            if lifecycle.state() == State::Staging {
                lifecycle.advance(State::Validating)?;
            }
            let staged = self.columns_of(&view).await?;
            contract::ensure_matches(relation, &declared, &staged)?;

            let names = declared
                .iter()
                .map(|column| column.name.clone())
                .collect::<Vec<_>>();
            self.execute(Statement::create_table(relation, declared))
                .await?;
            self.execute(Statement::insert_select(
                relation,
                names.clone(),
                Select::columns(&view, names),
            ))
            .await?
        } else {
            self.execute(Statement::create_table_as(relation, Select::star(&view)))
                .await?
        };

        self.drop_existing(&view).await?;
        lifecycle.release(&view);
        Ok(rows)
    }

    /// Builds the model's rows into `target`: directly when nothing exists
    /// under its name, otherwise into a scratch table swapped in afterwards.
    async fn build_table(
        &mut self,
        lifecycle: &mut Lifecycle,
        target: &Relation,
        existing: Option<&Relation>,
        model: &Model,
    ) -> Result<u64> {
        let Some(existing) = existing else {
            let rows = self.stage_table(lifecycle, target, model).await?;
            lifecycle.advance(State::Publishing)?;
            return Ok(rows);
        };

        let staged = lifecycle.own(target.as_temp(self.run_id()));
        self.drop_if_exists(&staged).await?;
        let rows = self.stage_table(lifecycle, &staged, model).await?;

        lifecycle.advance(State::Publishing)?;
        self.swap_into(&staged, target, existing).await?;
        lifecycle.release(&staged);
        Ok(rows)
    }
}
