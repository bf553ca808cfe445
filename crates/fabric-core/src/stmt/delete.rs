use super::{Expr, Statement};
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub target: Relation,
    pub filter: DeleteFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteFilter {
    /// Every row.
    All,

    /// Rows whose unique key appears in `source`, further narrowed by
    /// `predicates`.
    MatchingKeys {
        source: Relation,
        unique_key: Vec<String>,
        predicates: Vec<Expr>,
    },

    /// Rows satisfying every predicate.
    Predicates(Vec<Expr>),
}

impl Statement {
    pub fn delete_all(target: &Relation) -> Statement {
        Delete {
            target: target.clone(),
            filter: DeleteFilter::All,
        }
        .into()
    }

    pub fn delete_matching(
        target: &Relation,
        source: &Relation,
        unique_key: Vec<String>,
        predicates: Vec<Expr>,
    ) -> Statement {
        Delete {
            target: target.clone(),
            filter: DeleteFilter::MatchingKeys {
                source: source.clone(),
                unique_key,
                predicates,
            },
        }
        .into()
    }

    pub fn delete_where(target: &Relation, predicates: Vec<Expr>) -> Statement {
        Delete {
            target: target.clone(),
            filter: DeleteFilter::Predicates(predicates),
        }
        .into()
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}
