use super::Statement;
use crate::{schema::Column, Relation};

#[derive(Debug, Clone, PartialEq)]
pub struct AddColumns {
    pub relation: Relation,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropColumns {
    pub relation: Relation,
    pub columns: Vec<String>,
}

impl Statement {
    pub fn add_columns(relation: &Relation, columns: Vec<Column>) -> Statement {
        AddColumns {
            relation: relation.clone(),
            columns,
        }
        .into()
    }

    pub fn drop_columns(relation: &Relation, columns: Vec<String>) -> Statement {
        DropColumns {
            relation: relation.clone(),
            columns,
        }
        .into()
    }
}

impl From<AddColumns> for Statement {
    fn from(value: AddColumns) -> Self {
        Self::AddColumns(value)
    }
}

impl From<DropColumns> for Statement {
    fn from(value: DropColumns) -> Self {
        Self::DropColumns(value)
    }
}
