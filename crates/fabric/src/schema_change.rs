use crate::{lifecycle::Lifecycle, Adapter};

use fabric_core::{
    config::OnSchemaChange,
    schema::ColumnsDiff,
    stmt::{Select, SelectItem, Statement},
    Column, Error, Relation, Result,
};
use tracing::info;

/// Column changes to apply to an incremental target before new rows land.
#[derive(Debug, Default, PartialEq)]
struct Plan {
    add: Vec<Column>,
    drop: Vec<String>,

    /// `(column, new data type)`
    retype: Vec<(String, String)>,

    /// Columns the strategy writes, in target order.
    dest_columns: Vec<String>,
}

/// What reconciling an incremental target did.
#[derive(Debug, PartialEq)]
pub(crate) struct Reconciled {
    /// Columns incoming rows are written to, in target order.
    pub(crate) dest_columns: Vec<String>,

    /// The target was rebuilt under a scratch name and swapped in, so
    /// declared constraints must be attached again.
    pub(crate) rebuilt: bool,
}

impl Plan {
    fn is_empty(&self) -> bool {
        self.add.is_empty() && self.drop.is_empty() && self.retype.is_empty()
    }
}

fn plan(
    target: &Relation,
    existing: &[Column],
    staged: &[Column],
    policy: OnSchemaChange,
) -> Result<Plan> {
    let diff = ColumnsDiff::from(existing, staged);

    let shared = existing
        .iter()
        .filter(|column| staged.iter().any(|candidate| candidate.name == column.name))
        .map(|column| column.name.clone())
        .collect::<Vec<_>>();

    if diff.is_empty() {
        return Ok(Plan {
            dest_columns: shared,
            ..Plan::default()
        });
    }

    match policy {
        OnSchemaChange::Ignore => {
            info!(target = %target, changes = %diff.summary(), "column changes ignored");
            Ok(Plan {
                dest_columns: shared,
                ..Plan::default()
            })
        }
        OnSchemaChange::Fail => Err(Error::schema_drift(target, diff.summary())),
        OnSchemaChange::AppendNewColumns => {
            let add = diff.added().cloned().collect::<Vec<_>>();
            let dest_columns = shared
                .into_iter()
                .chain(add.iter().map(|column| column.name.clone()))
                .collect();
            Ok(Plan {
                add,
                dest_columns,
                ..Plan::default()
            })
        }
        OnSchemaChange::SyncAllColumns => {
            let add = diff.added().cloned().collect::<Vec<_>>();
            let dest_columns = shared
                .into_iter()
                .chain(add.iter().map(|column| column.name.clone()))
                .collect();
            Ok(Plan {
                add,
                drop: diff.removed().map(|column| column.name.clone()).collect(),
                retype: diff
                    .altered()
                    .map(|(_, next)| (next.name.clone(), next.data_type()))
                    .collect(),
                dest_columns,
            })
        }
    }
}

impl Adapter {
    /// Brings `target`'s columns in line with `staged` according to `policy`
    /// and returns the columns incoming rows are written to.
    ///
    /// Changes are made with `ALTER TABLE` where the warehouse allows it.
    /// Otherwise the target is rebuilt under a scratch name, its grants are
    /// copied over and it is swapped in. Constraints do not survive a
    /// rebuild; the caller attaches them again.
    pub(crate) async fn reconcile_schema(
        &mut self,
        lifecycle: &mut Lifecycle,
        target: &Relation,
        staged: &Relation,
        policy: OnSchemaChange,
    ) -> Result<Reconciled> {
        let existing = self.columns_of(target).await?;
        let incoming = self.columns_of(staged).await?;
        let plan = plan(target, &existing, &incoming, policy)?;

        if plan.is_empty() {
            return Ok(Reconciled {
                dest_columns: plan.dest_columns,
                rebuilt: false,
            });
        }

        info!(
            target = %target,
            add = plan.add.len(),
            drop = plan.drop.len(),
            retype = plan.retype.len(),
            "applying column changes"
        );

        let capability = self.capability();
        let in_place = plan.retype.is_empty()
            && (plan.add.is_empty() || capability.alter_add_column)
            && (plan.drop.is_empty() || capability.alter_drop_column);

        if in_place {
            if !plan.add.is_empty() {
                self.execute(Statement::add_columns(target, plan.add.clone()))
                    .await?;
            }
            if !plan.drop.is_empty() {
                self.execute(Statement::drop_columns(target, plan.drop.clone()))
                    .await?;
            }
        } else {
            self.rebuild(lifecycle, target, &existing, &plan).await?;
        }

        Ok(Reconciled {
            dest_columns: plan.dest_columns,
            rebuilt: !in_place,
        })
    }

    async fn rebuild(
        &mut self,
        lifecycle: &mut Lifecycle,
        target: &Relation,
        existing: &[Column],
        plan: &Plan,
    ) -> Result<()> {
        let mut items = vec![];
        for column in existing {
            if plan.drop.contains(&column.name) {
                continue;
            }
            match plan.retype.iter().find(|(name, _)| *name == column.name) {
                Some((name, data_type)) => items.push(SelectItem::Cast {
                    column: name.clone(),
                    data_type: data_type.clone(),
                }),
                None => items.push(SelectItem::Column(column.name.clone())),
            }
        }
        items.extend(plan.add.iter().map(|column| SelectItem::Null {
            column: column.name.clone(),
            data_type: column.data_type(),
        }));

        let rebuild = lifecycle.own(target.as_rebuild(self.run_id()));
        self.drop_if_exists(&rebuild).await?;
        self.execute(Statement::create_table_as(
            &rebuild,
            Select::star(target).with_items(items),
        ))
        .await?;
        self.copy_grants(target, &rebuild).await?;

        self.swap_into(&rebuild, target, target).await?;
        lifecycle.release(&rebuild);
        Ok(())
    }
}
