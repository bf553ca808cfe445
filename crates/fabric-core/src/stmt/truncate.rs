use super::Statement;
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct Truncate {
    pub relation: Relation,
}

impl Statement {
    pub fn truncate(relation: &Relation) -> Statement {
        Truncate {
            relation: relation.clone(),
        }
        .into()
    }
}

impl From<Truncate> for Statement {
    fn from(value: Truncate) -> Self {
        Self::Truncate(value)
    }
}
