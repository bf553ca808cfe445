use super::{Query, Statement};
use crate::Relation;

/// `CREATE TABLE ... AS <query>`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableAs {
    pub relation: Relation,
    pub query: Query,
}

impl Statement {
    pub fn create_table_as(relation: &Relation, query: impl Into<Query>) -> Statement {
        CreateTableAs {
            relation: relation.clone(),
            query: query.into(),
        }
        .into()
    }
}

impl From<CreateTableAs> for Statement {
    fn from(value: CreateTableAs) -> Self {
        Self::CreateTableAs(value)
    }
}
