use fabric_core::{
    config::Threshold,
    stmt::{self, Catalog, Expr, Query, Select, SelectItem, Statement, TestResult},
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

fn fabric(stmt: impl Into<Statement>) -> String {
    Serializer::fabric().serialize(&stmt.into(), &mut NoParams)
}

fn ansi(stmt: impl Into<Statement>) -> String {
    Serializer::ansi().serialize(&stmt.into(), &mut NoParams)
}

fn orders() -> Relation {
    Relation::table("dw", "dbo", "orders").unwrap()
}

#[test]
fn select_limit_by_dialect() {
    let select = Select::star(&orders()).with_limit(Some(10));

    assert_eq!(
        fabric(select.clone()),
        "SELECT TOP 10 * FROM \"dw\".\"dbo\".\"orders\";"
    );
    assert_eq!(ansi(select), "SELECT * FROM \"dw\".\"dbo\".\"orders\" LIMIT 10;");
}

#[test]
fn select_items_cast_and_fill() {
    let select = Select::star(&orders()).with_items(vec![
        SelectItem::Column("id".to_string()),
        SelectItem::Cast {
            column: "name".to_string(),
            data_type: "varchar(200)".to_string(),
        },
        SelectItem::Null {
            column: "note".to_string(),
            data_type: "varchar(8000)".to_string(),
        },
    ]);

    assert_eq!(
        fabric(select),
        "SELECT \"id\", CAST(\"name\" AS varchar(200)) AS \"name\", \
         CAST(NULL AS varchar(8000)) AS \"note\" FROM \"dw\".\"dbo\".\"orders\";"
    );
}

#[test]
fn select_filters() {
    let select = Select::columns(&orders(), ["id"]).with_filter(Expr::and([
        Expr::eq(Expr::column("status"), Expr::value("open")),
        Expr::is_not_null(Expr::column("id")),
    ]));
    assert_eq!(
        fabric(select),
        "SELECT \"id\" FROM \"dw\".\"dbo\".\"orders\" \
         WHERE (\"status\" = 'open') AND (\"id\" IS NOT NULL);"
    );

    let select =
        Select::star(&orders()).with_filter(Expr::eq(Expr::column("active"), Expr::value(true)));
    assert_eq!(
        fabric(select.clone()),
        "SELECT * FROM \"dw\".\"dbo\".\"orders\" WHERE \"active\" = 1;"
    );
    assert_eq!(
        ansi(select),
        "SELECT * FROM \"dw\".\"dbo\".\"orders\" WHERE \"active\" = TRUE;"
    );

    let select = Select::star(&orders()).with_filter(Expr::and(Vec::new()));
    assert_eq!(
        fabric(select),
        "SELECT * FROM \"dw\".\"dbo\".\"orders\" WHERE 1 = 1;"
    );
}

#[test]
fn count_rows() {
    assert_eq!(
        fabric(Query::count(&orders())),
        "SELECT COUNT(*) AS \"row_count\" FROM \"dw\".\"dbo\".\"orders\";"
    );
}

#[test]
fn test_result_applies_thresholds() {
    let test = Relation::view("dw", "dbo", "not_null_orders_id").unwrap();
    let stmt = TestResult {
        query: Select::star(&test),
        warn_if: Threshold::default(),
        error_if: ">=10".parse().unwrap(),
    };

    assert_eq!(
        fabric(stmt),
        "SELECT COUNT(*) AS \"failures\", \
         CASE WHEN COUNT(*) != 0 THEN 'true' ELSE 'false' END AS \"should_warn\", \
         CASE WHEN COUNT(*) >= 10 THEN 'true' ELSE 'false' END AS \"should_error\" \
         FROM (SELECT * FROM \"dw\".\"dbo\".\"not_null_orders_id\") AS \"dbt_internal_test\";"
    );
}

#[test]
fn catalog_lookups_name_their_database() {
    assert_eq!(
        fabric(Catalog::relation(&orders())),
        "SELECT TABLE_NAME AS \"name\", \
         CASE TABLE_TYPE WHEN 'VIEW' THEN 'view' ELSE 'table' END AS \"kind\" \
         FROM \"dw\".INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_SCHEMA = 'dbo' AND TABLE_NAME = 'orders';"
    );

    assert_eq!(
        fabric(Catalog::Columns(orders())),
        "SELECT COLUMN_NAME AS \"name\", DATA_TYPE AS \"data_type\", \
         CHARACTER_MAXIMUM_LENGTH AS \"char_size\", NUMERIC_PRECISION AS \"numeric_precision\", \
         NUMERIC_SCALE AS \"numeric_scale\", IS_NULLABLE AS \"is_nullable\" \
         FROM \"dw\".INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = 'dbo' AND TABLE_NAME = 'orders' \
         ORDER BY ORDINAL_POSITION;"
    );

    let dependents = fabric(Catalog::ViewDependents(orders()));
    assert!(dependents.contains("FROM \"dw\".sys.sql_expression_dependencies AS d"));
    assert!(dependents.ends_with("WHERE os.name = 'dbo' AND o.name = 'orders';"));

    let dependents = ansi(Catalog::ViewDependents(orders()));
    assert!(dependents.contains("\"dw\".INFORMATION_SCHEMA.VIEW_TABLE_USAGE"));
}

#[test]
fn render_limited_relation() {
    let serializer = Serializer::fabric();

    assert_eq!(
        serializer.render_limited(&orders(), None),
        "\"dw\".\"dbo\".\"orders\""
    );
    assert_eq!(
        serializer.render_limited(&orders(), Some(5)),
        "(SELECT TOP 5 * FROM \"dw\".\"dbo\".\"orders\") AS _dbt_limit_subq"
    );
    assert_eq!(
        serializer.render_limited(&orders(), Some(0)),
        "(SELECT * FROM \"dw\".\"dbo\".\"orders\" WHERE 1 = 0) AS _dbt_limit_subq"
    );
    assert_eq!(
        Serializer::ansi().render_limited(&orders(), Some(5)),
        "(SELECT * FROM \"dw\".\"dbo\".\"orders\" LIMIT 5) AS _dbt_limit_subq"
    );
}

#[test]
fn hash_is_null_safe() {
    let serializer = Serializer::fabric();

    assert_eq!(
        serializer.hash(&["\"id\"".to_string()]),
        "CONVERT(VARCHAR(32), HASHBYTES('MD5', COALESCE(CAST(\"id\" AS VARCHAR(8000)), '')), 2)"
    );
    assert_eq!(
        serializer.hash(&["\"id\"".to_string(), "\"line\"".to_string()]),
        "CONVERT(VARCHAR(32), HASHBYTES('MD5', \
         CONCAT(COALESCE(CAST(\"id\" AS VARCHAR(8000)), ''), '|', \
         COALESCE(CAST(\"line\" AS VARCHAR(8000)), ''))), 2)"
    );
    assert_eq!(
        Serializer::ansi().hash(&["\"id\"".to_string()]),
        "MD5(COALESCE(CAST(\"id\" AS VARCHAR), ''))"
    );
}
