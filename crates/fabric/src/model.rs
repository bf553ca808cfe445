use crate::State;

use fabric_core::{
    config::Grants,
    stmt::Value,
    Column, ModelConfig, Relation,
};

/// A model handed over by the orchestrator: where it goes, the SQL producing
/// its rows and its configuration.
#[derive(Debug, Clone)]
pub struct Model {
    pub target: Relation,
    pub sql: String,
    pub config: ModelConfig,
}

impl Model {
    pub fn new(target: Relation, sql: impl Into<String>, config: ModelConfig) -> Model {
        Model {
            target,
            sql: sql.into(),
            config,
        }
    }
}

/// Static rows loaded into a table.
#[derive(Debug, Clone)]
pub struct Seed {
    pub target: Relation,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    pub full_refresh: bool,
    pub grants: Grants,
}

impl Seed {
    pub fn new(target: Relation, columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Seed {
        Seed {
            target,
            columns,
            rows,
            full_refresh: false,
            grants: Grants::default(),
        }
    }
}

/// Result of a materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    /// Relations the materialization produced.
    pub relations: Vec<Relation>,

    /// Lifecycle states, in the order they were entered.
    pub history: Vec<State>,

    /// Rows written to the target, when the materialization counts them.
    pub rows_affected: Option<u64>,
}

/// Result of running a data test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub failures: u64,
    pub should_warn: bool,
    pub should_error: bool,

    /// The persisted failing rows, when failures were stored.
    pub relation: Option<Relation>,
}
