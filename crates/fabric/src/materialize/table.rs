use crate::{
    contract,
    grants::GrantMode,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Model,
};

use fabric_core::{Materialization, Relation, RelationKind, Result};

impl Adapter {
    pub(crate) async fn materialize_table(&mut self, model: &Model) -> Result<Materialized> {
        let mut lifecycle = Lifecycle::new(&model.target, Materialization::Table);
        let outcome = self.table_steps(&mut lifecycle, model).await;
        lifecycle.settle(self, outcome).await
    }

    async fn table_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        model: &Model,
    ) -> Result<(Vec<Relation>, Option<u64>)> {
        let target = model.target.as_kind(RelationKind::Table);
        contract::ensure_stageable(
            self.capability(),
            &target,
            &model.sql,
            model.config.contract.enforced,
        )?;

        let existing = self.get_relation(&target).await?;
        lifecycle.advance(State::Staging)?;

        let rows = self
            .build_table(lifecycle, &target, existing.as_ref(), model)
            .await?;

        self.apply_constraints(&target, &model.config).await?;
        self.apply_grants(&target, &model.config.grants, GrantMode::Replace)
            .await?;

        Ok((vec![target], Some(rows)))
    }
}
