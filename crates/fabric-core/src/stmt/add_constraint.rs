use super::Statement;
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct AddConstraint {
    pub relation: Relation,
    pub constraint: ConstraintDef,
}

/// A constraint ready to be attached to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub kind: ConstraintDefKind,

    /// When false the constraint is declared `NOT ENFORCED`.
    pub enforced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintDefKind {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey {
        columns: Vec<String>,

        /// Already rendered referenced relation.
        references: String,
        to_columns: Vec<String>,
    },
    Check(String),
}

impl Statement {
    pub fn add_constraint(relation: &Relation, constraint: ConstraintDef) -> Statement {
        AddConstraint {
            relation: relation.clone(),
            constraint,
        }
        .into()
    }
}

impl From<AddConstraint> for Statement {
    fn from(value: AddConstraint) -> Self {
        Self::AddConstraint(value)
    }
}
