mod add_constraint;
pub use add_constraint::{AddConstraint, ConstraintDef, ConstraintDefKind};

mod alter_columns;
pub use alter_columns::{AddColumns, DropColumns};

mod catalog;
pub use catalog::Catalog;

mod create_schema;
pub use create_schema::CreateSchema;

mod create_table;
pub use create_table::CreateTable;

mod create_table_as;
pub use create_table_as::CreateTableAs;

mod create_view;
pub use create_view::CreateView;

mod delete;
pub use delete::{Delete, DeleteFilter};

mod drop_relation;
pub use drop_relation::DropRelation;

mod expr;
pub use expr::{Expr, ExprColumn, Scope};

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod grant;
pub use grant::{Grant, Revoke};

mod insert;
pub use insert::{Insert, InsertSource};

mod merge;
pub use merge::Merge;

mod op_binary;
pub use op_binary::BinaryOp;

mod query;
pub use query::Query;

mod rename_relation;
pub use rename_relation::RenameRelation;

mod select;
pub use select::{Select, SelectItem};

mod snapshot;
pub use snapshot::{SnapshotBuild, SnapshotRule, SnapshotStaging, SNAPSHOT_META_COLUMNS};

mod test_result;
pub use test_result::TestResult;

mod truncate;
pub use truncate::Truncate;

mod update_from;
pub use update_from::UpdateFrom;

mod value;
pub use value::Value;

use crate::Relation;

/// Alias of the source relation in merge, delete and update statements.
pub const SOURCE_ALIAS: &str = "DBT_INTERNAL_SOURCE";

/// Alias of the target relation in merge, delete and update statements.
pub const TARGET_ALIAS: &str = "DBT_INTERNAL_DEST";

/// A statement the adapter sends to the warehouse.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    AddColumns(AddColumns),
    AddConstraint(AddConstraint),
    CreateSchema(CreateSchema),
    CreateTable(CreateTable),
    CreateTableAs(CreateTableAs),
    CreateView(CreateView),
    Delete(Delete),
    DropColumns(DropColumns),
    DropRelation(DropRelation),
    Grant(Grant),
    Insert(Insert),
    Merge(Merge),
    Query(Query),
    RenameRelation(RenameRelation),
    Revoke(Revoke),
    Truncate(Truncate),
    UpdateFrom(UpdateFrom),
}

impl Statement {
    /// The relation this statement creates, changes or removes.
    pub fn target(&self) -> Option<&Relation> {
        match self {
            Statement::AddColumns(stmt) => Some(&stmt.relation),
            Statement::AddConstraint(stmt) => Some(&stmt.relation),
            Statement::CreateSchema(_) => None,
            Statement::CreateTable(stmt) => Some(&stmt.relation),
            Statement::CreateTableAs(stmt) => Some(&stmt.relation),
            Statement::CreateView(stmt) => Some(&stmt.relation),
            Statement::Delete(stmt) => Some(&stmt.target),
            Statement::DropColumns(stmt) => Some(&stmt.relation),
            Statement::DropRelation(stmt) => Some(&stmt.relation),
            Statement::Grant(stmt) => Some(&stmt.relation),
            Statement::Insert(stmt) => Some(&stmt.target),
            Statement::Merge(stmt) => Some(&stmt.target),
            Statement::Query(_) => None,
            Statement::RenameRelation(stmt) => Some(&stmt.from),
            Statement::Revoke(stmt) => Some(&stmt.relation),
            Statement::Truncate(stmt) => Some(&stmt.relation),
            Statement::UpdateFrom(stmt) => Some(&stmt.target),
        }
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Statement::AddColumns(_) => "add_columns",
            Statement::AddConstraint(_) => "add_constraint",
            Statement::CreateSchema(_) => "create_schema",
            Statement::CreateTable(_) => "create_table",
            Statement::CreateTableAs(_) => "create_table_as",
            Statement::CreateView(_) => "create_view",
            Statement::Delete(_) => "delete",
            Statement::DropColumns(_) => "drop_columns",
            Statement::DropRelation(_) => "drop_relation",
            Statement::Grant(_) => "grant",
            Statement::Insert(_) => "insert",
            Statement::Merge(_) => "merge",
            Statement::Query(_) => "query",
            Statement::RenameRelation(_) => "rename_relation",
            Statement::Revoke(_) => "revoke",
            Statement::Truncate(_) => "truncate",
            Statement::UpdateFrom(_) => "update_from",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Statement::Query(_))
    }
}
