use super::Statement;
use crate::Relation;

/// Renames `from` to `to`'s identifier. Both live in the same schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameRelation {
    pub from: Relation,
    pub to: Relation,
}

impl Statement {
    pub fn rename_relation(from: &Relation, to: &Relation) -> Statement {
        RenameRelation {
            from: from.clone(),
            to: to.clone(),
        }
        .into()
    }
}

impl From<RenameRelation> for Statement {
    fn from(value: RenameRelation) -> Self {
        Self::RenameRelation(value)
    }
}
