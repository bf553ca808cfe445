use crate::{
    grants::GrantMode,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Model,
};

use fabric_core::{stmt::Query, stmt::Statement, Materialization, Relation, RelationKind, Result};

impl Adapter {
    pub(crate) async fn materialize_view(&mut self, model: &Model) -> Result<Materialized> {
        let mut lifecycle = Lifecycle::new(&model.target, Materialization::View);
        let outcome = self.view_steps(&mut lifecycle, model).await;
        lifecycle.settle(self, outcome).await
    }

    async fn view_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        model: &Model,
    ) -> Result<(Vec<Relation>, Option<u64>)> {
        let target = model.target.as_kind(RelationKind::View);
        let existing = self.get_relation(&target).await?;
        lifecycle.advance(State::Staging)?;

        match existing {
            None => {
                lifecycle.advance(State::Publishing)?;
                self.execute(Statement::create_view(&target, Query::sql(&model.sql)))
                    .await?;
            }
            Some(existing) if existing.is_view() && self.capability().atomic_replace => {
                lifecycle.advance(State::Publishing)?;
                self.execute(Statement::replace_view(&target, Query::sql(&model.sql)))
                    .await?;
            }
            Some(existing) => {
                let staged = lifecycle.own(target.as_temp_view(self.run_id()));
                self.drop_if_exists(&staged).await?;
                self.execute(Statement::create_view(&staged, Query::sql(&model.sql)))
                    .await?;

                lifecycle.advance(State::Publishing)?;
                self.swap_into(&staged, &target, &existing).await?;
                lifecycle.release(&staged);
            }
        }

        self.apply_grants(&target, &model.config.grants, GrantMode::Replace)
            .await?;

        Ok((vec![target], None))
    }
}
