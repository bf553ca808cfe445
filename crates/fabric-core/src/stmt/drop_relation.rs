use super::Statement;
use crate::Relation;

/// Drops a table or view. The relation's kind selects the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropRelation {
    pub relation: Relation,
    pub if_exists: bool,

    /// Remove dependent views too, where the dialect can.
    pub cascade: bool,
}

impl Statement {
    pub fn drop_relation(relation: &Relation) -> Statement {
        DropRelation {
            relation: relation.clone(),
            if_exists: true,
            cascade: false,
        }
        .into()
    }

    pub fn drop_relation_cascade(relation: &Relation) -> Statement {
        DropRelation {
            relation: relation.clone(),
            if_exists: true,
            cascade: true,
        }
        .into()
    }
}

impl From<DropRelation> for Statement {
    fn from(value: DropRelation) -> Self {
        Self::DropRelation(value)
    }
}
