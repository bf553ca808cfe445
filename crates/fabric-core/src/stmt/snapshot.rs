use super::{Query, Statement};
use crate::Relation;

/// Snapshot bookkeeping columns, in the order they are appended to the source
/// columns.
pub const SNAPSHOT_META_COLUMNS: [&str; 4] = [
    SnapshotBuild::SCD_ID,
    SnapshotBuild::UPDATED_AT,
    SnapshotBuild::VALID_FROM,
    SnapshotBuild::VALID_TO,
];

/// How a snapshot detects changed rows.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotRule {
    /// A row changed when its `updated_at` moved past the current version's
    /// `dbt_valid_from`.
    Timestamp { updated_at: String },

    /// A row changed when any checked column differs. Versions are stamped
    /// with `updated_at` when given, the current time otherwise.
    Check {
        columns: Vec<String>,
        updated_at: Option<String>,

        /// Treat every row as changed; set when the checked columns are not
        /// all present in the existing snapshot.
        always_changed: bool,
    },
}

impl SnapshotRule {
    pub fn updated_at(&self) -> Option<&str> {
        match self {
            SnapshotRule::Timestamp { updated_at } => Some(updated_at),
            SnapshotRule::Check { updated_at, .. } => updated_at.as_deref(),
        }
    }
}

/// First build of a snapshot: every source row becomes a current version.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotBuild {
    pub source: Relation,
    pub unique_key: Vec<String>,
    pub rule: SnapshotRule,
}

impl SnapshotBuild {
    pub const SCD_ID: &'static str = "dbt_scd_id";
    pub const UPDATED_AT: &'static str = "dbt_updated_at";
    pub const VALID_FROM: &'static str = "dbt_valid_from";
    pub const VALID_TO: &'static str = "dbt_valid_to";
    pub const CHANGE_TYPE: &'static str = "dbt_change_type";
    pub const UNIQUE_KEY: &'static str = "dbt_unique_key";
}

/// Rows to apply to an existing snapshot.
///
/// Produces the source columns plus `dbt_change_type`, `dbt_unique_key` and
/// the bookkeeping columns. `insert` rows are new versions, `update` rows
/// close the version identified by `dbt_scd_id`, and `delete` rows (only
/// when invalidating hard deletes) close versions whose key vanished from
/// the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStaging {
    pub source: Relation,
    pub target: Relation,
    pub unique_key: Vec<String>,
    pub rule: SnapshotRule,
    pub invalidate_hard_deletes: bool,
}

impl From<SnapshotBuild> for Query {
    fn from(value: SnapshotBuild) -> Query {
        Query::SnapshotBuild(value)
    }
}

impl From<SnapshotStaging> for Query {
    fn from(value: SnapshotStaging) -> Query {
        Query::SnapshotStaging(value)
    }
}

impl From<SnapshotStaging> for Statement {
    fn from(value: SnapshotStaging) -> Statement {
        Statement::Query(value.into())
    }
}
