use super::{Query, Statement};
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub relation: Relation,
    pub query: Query,

    /// Replace an existing view in place.
    pub or_replace: bool,
}

impl Statement {
    pub fn create_view(relation: &Relation, query: impl Into<Query>) -> Statement {
        CreateView {
            relation: relation.clone(),
            query: query.into(),
            or_replace: false,
        }
        .into()
    }

    pub fn replace_view(relation: &Relation, query: impl Into<Query>) -> Statement {
        CreateView {
            relation: relation.clone(),
            query: query.into(),
            or_replace: true,
        }
        .into()
    }
}

impl From<CreateView> for Statement {
    fn from(value: CreateView) -> Self {
        Self::CreateView(value)
    }
}
