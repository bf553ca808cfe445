use crate::{
    grants::GrantMode,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Seed,
};

use fabric_core::{stmt::Statement, Error, Materialization, Relation, RelationKind, Result};
use tracing::debug;

impl Adapter {
    /// Loads a seed's rows into its table, replacing what was there.
    ///
    /// Rows are bound as parameters, in batches small enough that no
    /// statement exceeds the warehouse's parameter or row ceiling.
    pub async fn load_seed(&mut self, seed: &Seed) -> Result<Materialized> {
        let mut lifecycle = Lifecycle::new(&seed.target, Materialization::Seed);
        let outcome = self.seed_steps(&mut lifecycle, seed).await;
        lifecycle.settle(self, outcome).await
    }

    async fn seed_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        seed: &Seed,
    ) -> Result<(Vec<Relation>, Option<u64>)> {
        let target = seed.target.as_kind(RelationKind::Table);

        if seed.columns.is_empty() {
            return Err(Error::invalid_config(format!("seed {target} has no columns")));
        }
        if let Some(index) = seed.rows.iter().position(|row| row.len() != seed.columns.len()) {
            return Err(Error::invalid_config(format!(
                "seed {target} row {} has {} values; expected {}",
                index + 1,
                seed.rows[index].len(),
                seed.columns.len()
            )));
        }

        let existing = self.get_relation(&target).await?;
        lifecycle.advance(State::Staging)?;

        let mut stmts = vec![];
        match existing {
            Some(existing) if existing.is_table() && !seed.full_refresh => {
                if self.capability().truncate {
                    stmts.push(Statement::truncate(&target));
                } else {
                    stmts.push(Statement::delete_all(&target));
                }
            }
            existing => {
                if let Some(existing) = existing {
                    self.drop_existing(&existing).await?;
                }
                self.execute(Statement::create_table(&target, seed.columns.clone()))
                    .await?;
            }
        }

        let names = seed
            .columns
            .iter()
            .map(|column| column.name.clone())
            .collect::<Vec<_>>();
        let batch_size = self.capability().insert_batch_size(names.len());
        let cleared = stmts.len();

        for batch in seed.rows.chunks(batch_size) {
            stmts.push(Statement::insert_values(&target, names.clone(), batch.to_vec()));
        }
        debug!(
            target = %target,
            rows = seed.rows.len(),
            batches = stmts.len() - cleared,
            batch_size,
            "loading seed"
        );

        lifecycle.advance(State::Publishing)?;
        let counts = self.execute_all(stmts).await?;
        let rows = counts[cleared..].iter().sum();

        self.apply_grants(&target, &seed.grants, GrantMode::Replace)
            .await?;

        Ok((vec![target], Some(rows)))
    }
}
