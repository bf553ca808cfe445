use super::{Catalog, Select, SnapshotBuild, SnapshotStaging, Statement, TestResult};
use crate::Relation;

/// A statement that produces rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Model SQL as written by its author
    Sql(String),

    Select(Select),

    /// `SELECT COUNT(*) AS row_count FROM relation`
    Count(Relation),

    Catalog(Catalog),

    TestResult(TestResult),

    SnapshotBuild(SnapshotBuild),

    SnapshotStaging(SnapshotStaging),
}

impl Query {
    pub fn sql(sql: impl Into<String>) -> Query {
        Query::Sql(sql.into())
    }

    pub fn count(relation: &Relation) -> Query {
        Query::Count(relation.clone())
    }
}

impl From<Query> for Statement {
    fn from(value: Query) -> Statement {
        Statement::Query(value)
    }
}
