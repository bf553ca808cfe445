use super::{Expr, Statement};
use crate::Relation;

/// `MERGE` of `source` into `target` on the unique key.
///
/// Without a key no target row matches and every source row is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub target: Relation,
    pub source: Relation,
    pub unique_key: Vec<String>,

    /// Columns overwritten on matched rows.
    pub update_columns: Vec<String>,

    /// Columns written for unmatched rows.
    pub insert_columns: Vec<String>,

    /// Extra conditions ANDed into the match.
    pub predicates: Vec<Expr>,
}

impl From<Merge> for Statement {
    fn from(value: Merge) -> Self {
        Self::Merge(value)
    }
}
