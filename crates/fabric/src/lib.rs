//! Materializes models into a Microsoft Fabric warehouse.
//!
//! The [`Adapter`] owns one warehouse connection and sequences the statements
//! each materialization needs. Operations the warehouse lacks (`ALTER TABLE
//! ... ADD COLUMN`, `TRUNCATE`, `CREATE OR REPLACE`, CTEs inside `INSERT`) are
//! emulated with staged relations, renames and rebuilds, following the
//! [`Capability`] table resolved from the configured dialect.

mod adapter;
pub use adapter::Adapter;

mod constraints;
mod contract;
mod dependents;
pub use dependents::MAX_DEPENDENCY_DEPTH;

mod grants;
mod introspect;

mod lifecycle;
pub use lifecycle::State;

mod materialize;

mod model;
pub use model::{Materialized, Model, Seed, TestOutcome};

mod publish;
mod schema_change;

pub mod strategy;
pub use strategy::{Strategy, StrategyArgs};

pub use fabric_core::{
    bail, err, AdapterConfig, Capability, Column, Connection, Dialect, Error, Materialization,
    ModelConfig, Relation, RelationKind, Result, RunId,
};
