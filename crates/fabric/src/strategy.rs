//! Incremental strategies: how staged rows reach an existing target.
//!
//! A strategy turns [`StrategyArgs`] into the statements to run. It does not
//! execute anything itself; the incremental materialization runs the
//! statements, inside one transaction where the warehouse allows it.

use fabric_core::{
    config::IncrementalStrategy,
    stmt::{Expr, Merge, Select, SnapshotBuild, Statement, UpdateFrom, Value},
    Capability, Error, Relation, Result,
};
use std::{fmt, str::FromStr};

/// Inputs shared by every strategy, built fresh for each run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyArgs {
    pub target: Relation,

    /// The staged rows.
    pub source: Relation,

    /// Empty, one column or a composite key.
    pub unique_key: Vec<String>,

    /// Columns written to the target, in target order.
    pub dest_columns: Vec<String>,

    /// Extra conditions ANDed into deletes and merge matches.
    pub predicates: Vec<Expr>,

    pub merge_update_columns: Option<Vec<String>>,
    pub merge_exclude_columns: Option<Vec<String>>,
}

impl StrategyArgs {
    pub fn new(target: &Relation, source: &Relation, dest_columns: Vec<String>) -> StrategyArgs {
        StrategyArgs {
            target: target.clone(),
            source: source.clone(),
            unique_key: vec![],
            dest_columns,
            predicates: vec![],
            merge_update_columns: None,
            merge_exclude_columns: None,
        }
    }

    pub fn with_unique_key(mut self, unique_key: &[String]) -> StrategyArgs {
        self.unique_key = unique_key.to_vec();
        self
    }

    pub fn with_predicates(mut self, predicates: impl IntoIterator<Item = Expr>) -> StrategyArgs {
        self.predicates.extend(predicates);
        self
    }

    /// Restricts target rows to one batch: `start <= event_time < end`.
    pub fn with_batch_window(
        mut self,
        event_time: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> StrategyArgs {
        if let Some(start) = start {
            self.predicates
                .push(Expr::ge(Expr::target(event_time), Expr::timestamp(start)));
        }
        if let Some(end) = end {
            self.predicates
                .push(Expr::lt(Expr::target(event_time), Expr::timestamp(end)));
        }
        self
    }
}

/// A resolved incremental strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Delete target rows sharing a key with the staged rows, then insert
    /// every staged row.
    DeleteInsert,

    /// One `MERGE`: matched rows are updated, the rest inserted.
    Merge,

    /// Delete target rows inside the batch window, then insert.
    Microbatch,

    /// Insert every staged row.
    Append,

    /// Apply staged snapshot changes: close the versions flagged `update` or
    /// `delete`, then insert the rows flagged `insert`. Never chosen from
    /// configuration.
    SnapshotMerge,
}

impl Strategy {
    /// `default` becomes `delete+insert` with a unique key and `append`
    /// without one.
    pub fn select(configured: IncrementalStrategy, has_unique_key: bool) -> Strategy {
        match configured {
            IncrementalStrategy::Default if has_unique_key => Strategy::DeleteInsert,
            IncrementalStrategy::Default => Strategy::Append,
            IncrementalStrategy::DeleteInsert => Strategy::DeleteInsert,
            IncrementalStrategy::Merge => Strategy::Merge,
            IncrementalStrategy::Microbatch => Strategy::Microbatch,
            IncrementalStrategy::Append => Strategy::Append,
        }
    }

    /// Looks a strategy up by its configured name. Unknown names fail.
    pub fn select_by_name(name: &str, has_unique_key: bool) -> Result<Strategy> {
        Ok(Strategy::select(
            name.parse::<IncrementalStrategy>()?,
            has_unique_key,
        ))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::DeleteInsert => "delete+insert",
            Strategy::Merge => "merge",
            Strategy::Microbatch => "microbatch",
            Strategy::Append => "append",
            Strategy::SnapshotMerge => "snapshot",
        }
    }

    /// The statements moving `args.source` into `args.target`, in order.
    pub fn statements(
        self,
        args: &StrategyArgs,
        capability: &Capability,
    ) -> Result<Vec<Statement>> {
        match self {
            Strategy::DeleteInsert => Ok(delete_insert(args)),
            Strategy::Merge => merge(args, capability).map(|stmt| vec![stmt]),
            Strategy::Microbatch => microbatch(args),
            Strategy::Append => Ok(vec![insert(args)]),
            Strategy::SnapshotMerge => Ok(snapshot_merge(args)),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    /// Parses a concrete strategy. `default` needs to know about the unique
    /// key and is rejected here; see [`Strategy::select_by_name`].
    fn from_str(name: &str) -> Result<Strategy> {
        match name.parse::<IncrementalStrategy>()? {
            IncrementalStrategy::Default => Err(Error::invalid_config(
                "the `default` strategy depends on the unique key; \
                 resolve it with `Strategy::select`",
            )),
            configured => Ok(Strategy::select(configured, false)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn insert(args: &StrategyArgs) -> Statement {
    Statement::insert_select(
        &args.target,
        args.dest_columns.clone(),
        Select::columns(&args.source, args.dest_columns.iter().cloned()),
    )
}

fn delete_insert(args: &StrategyArgs) -> Vec<Statement> {
    let delete = if !args.unique_key.is_empty() {
        Some(Statement::delete_matching(
            &args.target,
            &args.source,
            args.unique_key.clone(),
            args.predicates.clone(),
        ))
    } else if !args.predicates.is_empty() {
        Some(Statement::delete_where(&args.target, args.predicates.clone()))
    } else {
        None
    };

    delete.into_iter().chain([insert(args)]).collect()
}

fn microbatch(args: &StrategyArgs) -> Result<Vec<Statement>> {
    // Without a window the delete would empty the table.
    if args.predicates.is_empty() {
        return Err(Error::invalid_config(format!(
            "microbatch into {} has no batch window",
            args.target
        )));
    }

    Ok(vec![
        Statement::delete_where(&args.target, args.predicates.clone()),
        insert(args),
    ])
}

/// `args.source` holds the snapshot change rows; `dbt_change_type` says what
/// each one does.
fn snapshot_merge(args: &StrategyArgs) -> Vec<Statement> {
    let close = UpdateFrom {
        target: args.target.clone(),
        source: args.source.clone(),
        join: vec![SnapshotBuild::SCD_ID.to_string()],
        assignments: vec![SnapshotBuild::VALID_TO.to_string()],
        filter: vec![
            Expr::in_list(
                Expr::source(SnapshotBuild::CHANGE_TYPE),
                [Value::from("update"), Value::from("delete")],
            ),
            Expr::is_null(Expr::target(SnapshotBuild::VALID_TO)),
        ],
    };

    let insert = Statement::insert_select(
        &args.target,
        args.dest_columns.clone(),
        Select::columns(&args.source, args.dest_columns.iter().cloned()).with_filter(Expr::eq(
            Expr::column(SnapshotBuild::CHANGE_TYPE),
            Value::from("insert"),
        )),
    );

    vec![close.into(), insert]
}

fn merge(args: &StrategyArgs, capability: &Capability) -> Result<Statement> {
    if !capability.merge {
        return Err(Error::capability_violation(&args.target, "the merge strategy"));
    }

    let is_key = |column: &String| {
        args.unique_key
            .iter()
            .any(|key| key.eq_ignore_ascii_case(column))
    };

    let update_columns = match (&args.merge_update_columns, &args.merge_exclude_columns) {
        (Some(columns), _) => columns.clone(),
        (None, Some(excluded)) => args
            .dest_columns
            .iter()
            .filter(|column| !excluded.iter().any(|ex| ex.eq_ignore_ascii_case(column)))
            .cloned()
            .collect(),
        (None, None) => args.dest_columns.clone(),
    };

    Ok(Merge {
        target: args.target.clone(),
        source: args.source.clone(),
        unique_key: args.unique_key.clone(),
        update_columns: update_columns
            .into_iter()
            .filter(|column| !is_key(column))
            .collect(),
        insert_columns: args.dest_columns.clone(),
        predicates: args.predicates.clone(),
    }
    .into())
}
