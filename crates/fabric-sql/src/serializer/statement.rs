use super::{Formatter, Params, ToSql};

use fabric_core::stmt::Statement;

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::AddColumns(stmt) => stmt.to_sql(f),
            Statement::AddConstraint(stmt) => stmt.to_sql(f),
            Statement::CreateSchema(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::CreateTableAs(stmt) => stmt.to_sql(f),
            Statement::CreateView(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::DropColumns(stmt) => stmt.to_sql(f),
            Statement::DropRelation(stmt) => stmt.to_sql(f),
            Statement::Grant(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Merge(stmt) => stmt.to_sql(f),
            Statement::Query(stmt) => stmt.to_sql(f),
            Statement::RenameRelation(stmt) => stmt.to_sql(f),
            Statement::Revoke(stmt) => stmt.to_sql(f),
            Statement::Truncate(stmt) => stmt.to_sql(f),
            Statement::UpdateFrom(stmt) => stmt.to_sql(f),
        }
    }
}
