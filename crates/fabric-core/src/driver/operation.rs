mod query_sql;
pub use query_sql::QuerySql;

mod transaction;
pub use transaction::Transaction;

#[derive(Debug)]
pub enum Operation {
    /// Execute a SQL statement
    QuerySql(QuerySql),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),
}
