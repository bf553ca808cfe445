use crate::Adapter;

use fabric_core::{
    config::{ConstraintKind, ConstraintSpec},
    driver::{ConstraintSupport, ConstraintSupports},
    relation::MAX_IDENTIFIER_LENGTH,
    stmt::{ConstraintDef, ConstraintDefKind, Statement},
    Error, ModelConfig, Relation, Result,
};
use tracing::warn;

impl Adapter {
    /// Attaches the model's constraints to a populated table.
    ///
    /// `NOT NULL` is part of the column definitions and skipped here.
    /// Constraints the warehouse cannot declare are logged and skipped;
    /// those it accepts without checking are declared `NOT ENFORCED`.
    pub(crate) async fn apply_constraints(
        &mut self,
        relation: &Relation,
        config: &ModelConfig,
    ) -> Result<()> {
        let constraints = plan(&self.capability().constraints, relation, config)?;
        for constraint in constraints {
            self.execute(Statement::add_constraint(relation, constraint)).await?;
        }
        Ok(())
    }
}

/// Column-level constraints first, in column order, then model-level ones.
fn declared(config: &ModelConfig) -> Vec<ConstraintSpec> {
    let column_level = config.columns.iter().flat_map(|(name, column)| {
        column.constraints.iter().map(move |constraint| {
            let mut constraint = constraint.clone();
            if constraint.columns.is_empty() {
                constraint.columns = vec![name.clone()];
            }
            constraint
        })
    });

    column_level.chain(config.constraints.iter().cloned()).collect()
}

fn plan(
    supports: &ConstraintSupports,
    relation: &Relation,
    config: &ModelConfig,
) -> Result<Vec<ConstraintDef>> {
    let mut planned = vec![];

    for spec in declared(config) {
        let support = match spec.kind {
            ConstraintKind::NotNull => continue,
            ConstraintKind::PrimaryKey => supports.primary_key,
            ConstraintKind::Unique => supports.unique,
            ConstraintKind::ForeignKey => supports.foreign_key,
            ConstraintKind::Check => supports.check,
            ConstraintKind::Custom => ConstraintSupport::NotSupported,
        };

        if support == ConstraintSupport::NotSupported {
            warn!(
                relation = %relation,
                constraint = %spec.kind,
                "constraint not supported by the warehouse; skipped"
            );
            continue;
        }

        let kind = match spec.kind {
            ConstraintKind::PrimaryKey => ConstraintDefKind::PrimaryKey(spec.columns.clone()),
            ConstraintKind::Unique => ConstraintDefKind::Unique(spec.columns.clone()),
            ConstraintKind::ForeignKey => {
                let Some(references) = spec.to.clone() else {
                    return Err(Error::invalid_config(format!(
                        "foreign key on {relation} ({}) has no `to` relation",
                        spec.columns.join(", ")
                    )));
                };
                ConstraintDefKind::ForeignKey {
                    columns: spec.columns.clone(),
                    references,
                    to_columns: spec.to_columns.clone(),
                }
            }
            ConstraintKind::Check => {
                let Some(expression) = spec.expression.clone() else {
                    return Err(Error::invalid_config(format!(
                        "check constraint on {relation} has no expression"
                    )));
                };
                ConstraintDefKind::Check(expression)
            }
            ConstraintKind::NotNull | ConstraintKind::Custom => continue,
        };

        if spec.columns.is_empty() && !matches!(kind, ConstraintDefKind::Check(_)) {
            return Err(Error::invalid_config(format!(
                "{} constraint on {relation} names no columns",
                spec.kind
            )));
        }

        planned.push(ConstraintDef {
            name: spec
                .name
                .clone()
                .unwrap_or_else(|| default_name(relation, &spec, planned.len())),
            kind,
            enforced: support == ConstraintSupport::Enforced,
        });
    }

    Ok(planned)
}

/// `pk_orders_id`, `uq_orders_email`, ... shortened to fit an identifier.
fn default_name(relation: &Relation, spec: &ConstraintSpec, index: usize) -> String {
    let prefix = match spec.kind {
        ConstraintKind::PrimaryKey => "pk",
        ConstraintKind::Unique => "uq",
        ConstraintKind::ForeignKey => "fk",
        ConstraintKind::Check => "ck",
        ConstraintKind::NotNull | ConstraintKind::Custom => "c",
    };

    let name = if spec.columns.is_empty() {
        format!("{prefix}_{}_{index}", relation.identifier())
    } else {
        format!("{prefix}_{}_{}", relation.identifier(), spec.columns.join("_"))
    };
    name.chars().take(MAX_IDENTIFIER_LENGTH).collect()
}
