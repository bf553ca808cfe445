use super::{Select, Statement, Value};
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub target: Relation,
    pub columns: Vec<String>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Select(Select),

    /// Row constructors; values are bound as parameters.
    Values(Vec<Vec<Value>>),
}

impl Statement {
    pub fn insert_select(target: &Relation, columns: Vec<String>, source: Select) -> Statement {
        Insert {
            target: target.clone(),
            columns,
            source: InsertSource::Select(source),
        }
        .into()
    }

    pub fn insert_values(
        target: &Relation,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Statement {
        Insert {
            target: target.clone(),
            columns,
            source: InsertSource::Values(rows),
        }
        .into()
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
