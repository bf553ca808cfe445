use fabric_core::{
    driver::operation::Transaction,
    schema::Column,
    stmt::{self, ConstraintDef, ConstraintDefKind, Query, Statement},
    Relation,
};
use fabric_sql::{Params, Placeholder, Serializer};
use pretty_assertions::assert_eq;

struct NoParams;

impl Params for NoParams {
    fn push(&mut self, _: &stmt::Value) -> Placeholder {
        Placeholder(0)
    }
}

fn fabric(stmt: &Statement) -> String {
    Serializer::fabric().serialize(stmt, &mut NoParams)
}

fn ansi(stmt: &Statement) -> String {
    Serializer::ansi().serialize(stmt, &mut NoParams)
}

fn orders() -> Relation {
    Relation::table("dw", "dbo", "orders").unwrap()
}

fn orders_view() -> Relation {
    Relation::view("dw", "dbo", "orders_v").unwrap()
}

#[test]
fn create_schema_is_idempotent() {
    let stmt = Statement::create_schema("dw", "staging");

    assert_eq!(
        fabric(&stmt),
        "IF NOT EXISTS (SELECT 1 FROM \"dw\".sys.schemas WHERE name = 'staging') \
         EXEC \"dw\".sys.sp_executesql N'CREATE SCHEMA \"staging\"';"
    );
    assert_eq!(ansi(&stmt), "CREATE SCHEMA IF NOT EXISTS \"dw\".\"staging\";");
}

#[test]
fn create_table_with_column_definitions() {
    let stmt = Statement::create_table(
        &orders(),
        vec![
            Column::new("id", "int").not_null(),
            Column::new("name", "varchar").with_char_size(100),
            Column::new("placed_at", "datetime2"),
        ],
    );

    assert_eq!(
        fabric(&stmt),
        "CREATE TABLE \"dw\".\"dbo\".\"orders\" \
         (\"id\" int NOT NULL, \"name\" varchar(100), \"placed_at\" datetime2(6));"
    );
}

#[test]
fn create_table_as_strips_trailing_terminator() {
    let stmt = Statement::create_table_as(&orders(), Query::sql("select 1 as id;\n"));

    assert_eq!(
        fabric(&stmt),
        "CREATE TABLE \"dw\".\"dbo\".\"orders\" AS select 1 as id;"
    );
}

#[test]
fn fabric_views_are_created_inside_their_database() {
    let stmt = Statement::create_view(&orders_view(), Query::sql("select 'a' as x"));
    assert_eq!(
        fabric(&stmt),
        "EXEC \"dw\".sys.sp_executesql N'CREATE VIEW \"dbo\".\"orders_v\" AS select ''a'' as x';"
    );

    let stmt = Statement::replace_view(&orders_view(), Query::sql("select 1 as x"));
    assert_eq!(
        fabric(&stmt),
        "EXEC \"dw\".sys.sp_executesql \
         N'CREATE OR ALTER VIEW \"dbo\".\"orders_v\" AS select 1 as x';"
    );
    assert_eq!(
        ansi(&stmt),
        "CREATE OR REPLACE VIEW \"dw\".\"dbo\".\"orders_v\" AS select 1 as x;"
    );
}

#[test]
fn drop_relation_by_kind() {
    assert_eq!(
        fabric(&Statement::drop_relation(&orders())),
        "DROP TABLE IF EXISTS \"dw\".\"dbo\".\"orders\";"
    );
    assert_eq!(
        fabric(&Statement::drop_relation(&orders_view())),
        "EXEC \"dw\".sys.sp_executesql N'DROP VIEW IF EXISTS \"dbo\".\"orders_v\"';"
    );
    assert_eq!(
        ansi(&Statement::drop_relation_cascade(&orders_view())),
        "DROP VIEW IF EXISTS \"dw\".\"dbo\".\"orders_v\" CASCADE;"
    );
    assert_eq!(
        ansi(&Statement::drop_relation(&orders_view())),
        "DROP VIEW IF EXISTS \"dw\".\"dbo\".\"orders_v\";"
    );
}

#[test]
fn rename_relation() {
    let to = orders().with_identifier("orders_bak").unwrap();
    let stmt = Statement::rename_relation(&orders(), &to);

    assert_eq!(
        fabric(&stmt),
        "EXEC \"dw\".sys.sp_rename N'[dbo].[orders]', N'orders_bak';"
    );
    assert_eq!(
        ansi(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" RENAME TO \"orders_bak\";"
    );
}

#[test]
fn alter_columns() {
    let stmt = Statement::add_columns(
        &orders(),
        vec![Column::new("note", "varchar"), Column::new("qty", "int").not_null()],
    );
    assert_eq!(
        fabric(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" ADD \"note\" varchar(8000), \"qty\" int NOT NULL;"
    );
    assert_eq!(
        ansi(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" \
         ADD COLUMN \"note\" varchar(8000), ADD COLUMN \"qty\" int NOT NULL;"
    );

    let stmt = Statement::drop_columns(&orders(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        fabric(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" DROP COLUMN \"a\", \"b\";"
    );
    assert_eq!(
        ansi(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" DROP COLUMN \"a\", DROP COLUMN \"b\";"
    );
}

#[test]
fn constraints_not_enforced() {
    let stmt = Statement::add_constraint(
        &orders(),
        ConstraintDef {
            name: "pk_orders_id".to_string(),
            kind: ConstraintDefKind::PrimaryKey(vec!["id".to_string()]),
            enforced: false,
        },
    );
    assert_eq!(
        fabric(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" ADD CONSTRAINT \"pk_orders_id\" \
         PRIMARY KEY NONCLUSTERED (\"id\") NOT ENFORCED;"
    );

    let stmt = Statement::add_constraint(
        &orders(),
        ConstraintDef {
            name: "fk_orders_customer_id".to_string(),
            kind: ConstraintDefKind::ForeignKey {
                columns: vec!["customer_id".to_string()],
                references: "\"dw\".\"dbo\".\"customers\"".to_string(),
                to_columns: vec!["id".to_string()],
            },
            enforced: false,
        },
    );
    assert_eq!(
        fabric(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" ADD CONSTRAINT \"fk_orders_customer_id\" \
         FOREIGN KEY (\"customer_id\") \
         REFERENCES \"dw\".\"dbo\".\"customers\" (\"id\") NOT ENFORCED;"
    );

    let stmt = Statement::add_constraint(
        &orders(),
        ConstraintDef {
            name: "uq_orders_code".to_string(),
            kind: ConstraintDefKind::Unique(vec!["code".to_string()]),
            enforced: true,
        },
    );
    assert_eq!(
        ansi(&stmt),
        "ALTER TABLE \"dw\".\"dbo\".\"orders\" ADD CONSTRAINT \"uq_orders_code\" UNIQUE (\"code\");"
    );
}

#[test]
fn grants_and_revokes() {
    let stmt = Statement::grant(
        &orders(),
        "select",
        vec!["analyst".to_string(), "reporter".to_string()],
    );
    assert_eq!(
        fabric(&stmt),
        "EXEC \"dw\".sys.sp_executesql \
         N'GRANT SELECT ON \"dbo\".\"orders\" TO \"analyst\", \"reporter\"';"
    );

    let stmt = Statement::revoke(&orders(), "select", vec!["analyst".to_string()]);
    assert_eq!(
        ansi(&stmt),
        "REVOKE SELECT ON \"dw\".\"dbo\".\"orders\" FROM \"analyst\";"
    );
}

#[test]
fn truncate_and_transactions() {
    assert_eq!(
        fabric(&Statement::truncate(&orders())),
        "TRUNCATE TABLE \"dw\".\"dbo\".\"orders\";"
    );

    assert_eq!(
        Serializer::fabric().serialize_transaction(&Transaction::Start),
        "BEGIN TRANSACTION"
    );
    assert_eq!(
        Serializer::ansi().serialize_transaction(&Transaction::Start),
        "BEGIN"
    );
    assert_eq!(
        Serializer::ansi().serialize_transaction(&Transaction::Rollback),
        "ROLLBACK"
    );
}

#[test]
fn identifiers_escape_quotes() {
    let odd = Relation::table("dw", "dbo", "we\"ird").unwrap();
    assert_eq!(
        fabric(&Statement::truncate(&odd)),
        "TRUNCATE TABLE \"dw\".\"dbo\".\"we\"\"ird\";"
    );
}
