use super::{Expr, Statement};
use crate::Relation;

/// Updates `target` rows from the `source` row joined on `join` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFrom {
    pub target: Relation,
    pub source: Relation,
    pub join: Vec<String>,

    /// Columns copied from the source row.
    pub assignments: Vec<String>,

    pub filter: Vec<Expr>,
}

impl From<UpdateFrom> for Statement {
    fn from(value: UpdateFrom) -> Self {
        Self::UpdateFrom(value)
    }
}
