use super::Statement;
use crate::{schema::Column, Relation};

/// Creates an empty table with declared columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub relation: Relation,
    pub columns: Vec<Column>,
}

impl Statement {
    pub fn create_table(relation: &Relation, columns: Vec<Column>) -> Statement {
        CreateTable {
            relation: relation.clone(),
            columns,
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
