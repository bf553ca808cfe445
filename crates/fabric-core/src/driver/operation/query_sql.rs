use super::Operation;

use crate::stmt;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The statement being executed
    pub stmt: stmt::Statement,

    /// `stmt` rendered for the connection's dialect
    pub sql: String,

    /// Values bound to the `?` placeholders in `sql`, in order
    pub params: Vec<stmt::Value>,

    /// When true, the caller expects a result set rather than a row count
    pub fetch: bool,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
