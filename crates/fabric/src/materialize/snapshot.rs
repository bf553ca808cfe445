use crate::{
    grants::GrantMode,
    lifecycle::{Lifecycle, State},
    Adapter, Materialized, Model, Strategy, StrategyArgs,
};

use fabric_core::{
    config::{CheckCols, HardDeletes, OnSchemaChange, SnapshotStrategySettings},
    stmt::{
        Query, Select, SnapshotBuild, SnapshotRule, SnapshotStaging, Statement,
        SNAPSHOT_META_COLUMNS,
    },
    Column, Error, Materialization, Relation, RelationKind, Result,
};
use tracing::info;

impl Adapter {
    pub(crate) async fn materialize_snapshot(&mut self, model: &Model) -> Result<Materialized> {
        let mut lifecycle = Lifecycle::new(&model.target, Materialization::Snapshot);
        let outcome = self.snapshot_steps(&mut lifecycle, model).await;
        lifecycle.settle(self, outcome).await
    }

    /// Records the source's current rows as versions in the snapshot table.
    ///
    /// The first run copies every source row as a current version. Later
    /// runs stage the changes (new versions, versions to close, and deleted
    /// keys when hard deletes are invalidated) in a scratch table, close the
    /// superseded versions and insert the new ones.
    async fn snapshot_steps(
        &mut self,
        lifecycle: &mut Lifecycle,
        model: &Model,
    ) -> Result<(Vec<Relation>, Option<u64>)> {
        let settings = model.config.snapshot_settings()?;
        let target = model.target.as_kind(RelationKind::Table);
        let unique_key = settings.unique_key.columns().to_vec();

        let existing = self.get_relation(&target).await?;
        if let Some(existing) = existing.as_ref().filter(|existing| existing.is_view()) {
            return Err(Error::invalid_config(format!(
                "snapshot target {existing} is a view; drop it before snapshotting"
            )));
        }

        lifecycle.advance(State::Staging)?;
        let source = lifecycle.own(target.as_staging_view(self.run_id()));
        self.drop_if_exists(&source).await?;
        self.execute(Statement::create_view(&source, Query::sql(&model.sql)))
            .await?;
        let source_columns = self.columns_of(&source).await?;

        let Some(existing) = existing else {
            let rule = rule(&settings.strategy, &source_columns, None);

            lifecycle.advance(State::Publishing)?;
            let rows = self
                .execute(Statement::create_table_as(
                    &target,
                    SnapshotBuild {
                        source: source.clone(),
                        unique_key,
                        rule,
                    },
                ))
                .await?;

            self.drop_existing(&source).await?;
            lifecycle.release(&source);
            self.apply_grants(&target, &model.config.grants, GrantMode::Replace)
                .await?;
            return Ok((vec![target], Some(rows)));
        };

        lifecycle.advance(State::Validating)?;
        let snapshot_columns = self.columns_of(&existing).await?;
        let rule = rule(
            &settings.strategy,
            &source_columns,
            Some(snapshot_columns.as_slice()),
        );

        // Source columns the snapshot has not seen yet are appended; nothing
        // is ever dropped from the history.
        self.reconcile_schema(
            lifecycle,
            &existing,
            &source,
            OnSchemaChange::AppendNewColumns,
        )
        .await?;

        let staging = lifecycle.own(target.as_temp(self.run_id()));
        self.drop_if_exists(&staging).await?;
        self.stage_snapshot_changes(
            lifecycle,
            &staging,
            SnapshotStaging {
                source: source.clone(),
                target: existing.clone(),
                unique_key,
                rule,
                invalidate_hard_deletes: settings.hard_deletes == HardDeletes::Invalidate,
            },
        )
        .await?;

        // The insert list is settled before the close-out update runs.
        let staged_columns = self.columns_of(&staging).await?;
        let snapshot_columns = self.columns_of(&existing).await?;
        let dest_columns = merged_columns(&existing, &staged_columns, &snapshot_columns)?;

        let stmts = Strategy::SnapshotMerge.statements(
            &StrategyArgs::new(&existing, &staging, dest_columns),
            self.capability(),
        )?;

        lifecycle.advance(State::Publishing)?;
        let rows = self.execute_all(stmts).await?.into_iter().sum::<u64>();
        info!(target = %target, rows, "snapshot merged");

        for scratch in [&staging, &source] {
            self.drop_existing(scratch).await?;
            lifecycle.release(scratch);
        }

        self.apply_grants(&target, &model.config.grants, GrantMode::Additive)
            .await?;

        Ok((vec![target], Some(rows)))
    }

    /// Creates `staging` holding the changes to apply. The change query opens
    /// with CTEs, so it goes through a view where those cannot be nested in
    /// `CREATE TABLE AS`.
    async fn stage_snapshot_changes(
        &mut self,
        lifecycle: &mut Lifecycle,
        staging: &Relation,
        changes: SnapshotStaging,
    ) -> Result<()> {
        if !self.capability().view_indirection_for_cte {
            self.execute(Statement::create_table_as(staging, changes))
                .await?;
            return Ok(());
        }

        let view = lifecycle.own(staging.as_temp_view(self.run_id()));
        self.drop_if_exists(&view).await?;
        self.execute(Statement::create_view(&view, changes)).await?;
        self.execute(Statement::create_table_as(staging, Select::star(&view)))
            .await?;

        self.drop_existing(&view).await?;
        lifecycle.release(&view);
        Ok(())
    }
}

/// Staged columns the snapshot also has, in staging order. Snapshot columns
/// the source no longer produces are left out and get `NULL`.
fn merged_columns(
    target: &Relation,
    staged: &[Column],
    snapshot: &[Column],
) -> Result<Vec<String>> {
    let columns = staged
        .iter()
        .map(|column| &column.name)
        .filter(|name| *name != SnapshotBuild::CHANGE_TYPE && *name != SnapshotBuild::UNIQUE_KEY)
        .filter(|name| snapshot.iter().any(|column| column.name == **name))
        .cloned()
        .collect::<Vec<_>>();

    if let Some(missing) = SNAPSHOT_META_COLUMNS
        .iter()
        .find(|meta| !columns.iter().any(|name| name == *meta))
    {
        return Err(Error::invalid_result(format!(
            "cannot merge into snapshot {target}: `{missing}` is missing"
        )));
    }

    Ok(columns)
}

/// The change rule for this run. Checked columns missing from the existing
/// snapshot make every row count as changed.
fn rule(
    strategy: &SnapshotStrategySettings,
    source: &[Column],
    snapshot: Option<&[Column]>,
) -> SnapshotRule {
    match strategy {
        SnapshotStrategySettings::Timestamp { updated_at } => SnapshotRule::Timestamp {
            updated_at: updated_at.clone(),
        },
        SnapshotStrategySettings::Check {
            check_cols,
            updated_at,
        } => {
            let columns = match check_cols {
                CheckCols::All => source.iter().map(|column| column.name.clone()).collect(),
                CheckCols::Columns(columns) => columns.clone(),
            };
            let always_changed = snapshot.is_some_and(|snapshot| {
                columns
                    .iter()
                    .any(|name| !snapshot.iter().any(|column| column.name == *name))
            });

            SnapshotRule::Check {
                columns,
                updated_at: updated_at.clone(),
                always_changed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_check_columns_mark_every_row_changed() {
        let strategy = SnapshotStrategySettings::Check {
            check_cols: CheckCols::Columns(vec!["status".to_string(), "tier".to_string()]),
            updated_at: None,
        };
        let source = vec![
            Column::new("id", "int"),
            Column::new("status", "varchar"),
            Column::new("tier", "int"),
        ];
        let snapshot = vec![Column::new("id", "int"), Column::new("status", "varchar")];

        let SnapshotRule::Check { always_changed, .. } =
            rule(&strategy, &source, Some(snapshot.as_slice()))
        else {
            panic!("expected a check rule");
        };
        assert!(always_changed);

        let SnapshotRule::Check { always_changed, .. } = rule(&strategy, &source, None) else {
            panic!("expected a check rule");
        };
        assert!(!always_changed);
    }

    #[test]
    fn merged_columns_skip_what_the_snapshot_lacks() {
        let target = Relation::table("dw", "dbo", "customers_snapshot").unwrap();
        let meta = SNAPSHOT_META_COLUMNS.map(|name| Column::new(name, "varchar"));
        let staged = [
            vec![
                Column::new(SnapshotBuild::CHANGE_TYPE, "varchar"),
                Column::new("id", "int"),
                Column::new("updated_at", "varchar"),
                Column::new(SnapshotBuild::UNIQUE_KEY, "int"),
            ],
            meta.to_vec(),
        ]
        .concat();
        let snapshot = [
            vec![
                Column::new("id", "int"),
                Column::new("name", "varchar"),
                Column::new("updated_at", "varchar"),
            ],
            meta.to_vec(),
        ]
        .concat();

        assert_eq!(
            merged_columns(&target, &staged, &snapshot).unwrap(),
            [
                "id",
                "updated_at",
                "dbt_scd_id",
                "dbt_updated_at",
                "dbt_valid_from",
                "dbt_valid_to"
            ]
        );

        let err = merged_columns(&target, &staged, &snapshot[..3]).unwrap_err();
        assert!(err.is_invalid_result());
        assert!(err.to_string().contains("dbt_scd_id"));
    }

    #[test]
    fn check_all_compares_every_source_column() {
        let strategy = SnapshotStrategySettings::Check {
            check_cols: CheckCols::All,
            updated_at: Some("ts".to_string()),
        };
        let source = vec![Column::new("id", "int"), Column::new("ts", "datetime2")];

        assert_eq!(
            rule(&strategy, &source, None),
            SnapshotRule::Check {
                columns: vec!["id".to_string(), "ts".to_string()],
                updated_at: Some("ts".to_string()),
                always_changed: false,
            }
        );
    }
}
