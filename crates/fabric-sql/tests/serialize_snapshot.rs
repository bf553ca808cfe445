use fabric_core::{
    stmt::{self, SnapshotBuild, SnapshotRule, SnapshotStaging, Statement},
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

fn fabric(stmt: impl Into<stmt::Query>) -> String {
    Serializer::fabric().serialize(&Statement::Query(stmt.into()), &mut NoParams)
}

fn source() -> Relation {
    Relation::view("dw", "snap", "orders_src").unwrap()
}

fn target() -> Relation {
    Relation::table("dw", "snap", "orders_snapshot").unwrap()
}

fn staging(
    rule: SnapshotRule,
    unique_key: &[&str],
    invalidate_hard_deletes: bool,
) -> SnapshotStaging {
    SnapshotStaging {
        source: source(),
        target: target(),
        unique_key: unique_key.iter().map(|key| key.to_string()).collect(),
        rule,
        invalidate_hard_deletes,
    }
}

fn timestamp_rule() -> SnapshotRule {
    SnapshotRule::Timestamp {
        updated_at: "updated_at".to_string(),
    }
}

#[test]
fn first_build_stamps_every_row() {
    let build = SnapshotBuild {
        source: source(),
        unique_key: vec!["id".to_string()],
        rule: timestamp_rule(),
    };

    assert_eq!(
        fabric(build),
        "SELECT *, CONVERT(VARCHAR(32), HASHBYTES('MD5', \
         CONCAT(COALESCE(CAST(\"id\" AS VARCHAR(8000)), ''), '|', \
         COALESCE(CAST(\"updated_at\" AS VARCHAR(8000)), ''))), 2) AS \"dbt_scd_id\", \
         \"updated_at\" AS \"dbt_updated_at\", \"updated_at\" AS \"dbt_valid_from\", \
         CAST(NULL AS DATETIME2(6)) AS \"dbt_valid_to\" FROM \"dw\".\"snap\".\"orders_src\";"
    );
}

#[test]
fn check_build_without_updated_at_uses_current_time() {
    let build = SnapshotBuild {
        source: source(),
        unique_key: vec!["id".to_string()],
        rule: SnapshotRule::Check {
            columns: vec!["status".to_string()],
            updated_at: None,
            always_changed: false,
        },
    };

    let sql = fabric(build);
    assert!(sql.contains(
        "CAST(SYSDATETIME() AS DATETIME2(6)) AS \"dbt_updated_at\", \
         CAST(SYSDATETIME() AS DATETIME2(6)) AS \"dbt_valid_from\""
    ));
}

#[test]
fn staging_timestamp_strategy() {
    let sql = fabric(staging(timestamp_rule(), &["id"], false));

    assert!(sql.starts_with(
        "WITH snapshot_query AS (SELECT * FROM \"dw\".\"snap\".\"orders_src\"),\n\
         snapshotted_data AS (SELECT *, \"id\" AS \"dbt_unique_key\" \
         FROM \"dw\".\"snap\".\"orders_snapshot\" \
         WHERE \"dbt_valid_to\" IS NULL),\n"
    ));
    assert!(sql.contains(
        "WHERE (snapshotted_data.\"dbt_valid_from\" < source_data.\"dbt_updated_at\"))"
    ));
    assert!(!sql.contains("deletes"));
    assert!(sql.ends_with("\nSELECT * FROM insertions UNION ALL SELECT * FROM updates;"));
}

#[test]
fn staging_with_hard_deletes() {
    let sql = fabric(staging(timestamp_rule(), &["id"], true));

    assert!(sql.contains(
        "deletes_source_data AS (SELECT *, \"id\" AS \"dbt_unique_key\" FROM snapshot_query),\n"
    ));
    assert!(sql.contains(
        "deletes AS (SELECT 'delete' AS \"dbt_change_type\", source_data.*, \
         CAST(SYSDATETIME() AS DATETIME2(6)) AS \"dbt_updated_at\""
    ));
    assert!(sql.contains("WHERE source_data.\"dbt_unique_key\" IS NULL)"));
    assert!(sql.ends_with(
        "SELECT * FROM insertions UNION ALL SELECT * FROM updates UNION ALL SELECT * FROM deletes;"
    ));
}

#[test]
fn staging_check_strategy_is_null_aware() {
    let rule = SnapshotRule::Check {
        columns: vec!["status".to_string()],
        updated_at: Some("updated_at".to_string()),
        always_changed: false,
    };
    let sql = fabric(staging(rule, &["id"], false));

    assert!(sql.contains(
        "snapshotted_data.\"status\" <> source_data.\"status\" \
         OR (snapshotted_data.\"status\" IS NULL AND source_data.\"status\" IS NOT NULL) \
         OR (snapshotted_data.\"status\" IS NOT NULL AND source_data.\"status\" IS NULL)"
    ));
}

#[test]
fn staging_new_check_columns_change_every_row() {
    let rule = SnapshotRule::Check {
        columns: vec!["status".to_string()],
        updated_at: None,
        always_changed: true,
    };
    let sql = fabric(staging(rule, &["id"], false));

    assert!(sql.contains("IS NOT NULL AND (1 = 1))),\n"));
    assert!(sql.contains("WHERE (1 = 1))"));
}

#[test]
fn staging_composite_key_is_hashed() {
    let sql = fabric(staging(timestamp_rule(), &["id", "line"], false));

    assert!(sql.contains(
        "snapshotted_data AS (SELECT *, CONVERT(VARCHAR(32), HASHBYTES('MD5', \
         CONCAT(COALESCE(CAST(\"id\" AS VARCHAR(8000)), ''), '|', \
         COALESCE(CAST(\"line\" AS VARCHAR(8000)), ''))), 2) AS \"dbt_unique_key\""
    ));
}

#[test]
fn staging_view_runs_in_its_database_on_fabric() {
    let view = Relation::view("dw", "snap", "orders_snapshot__dbt_tmp_view").unwrap();
    let stmt = Statement::create_view(&view, staging(timestamp_rule(), &["id"], false));

    let sql = Serializer::fabric().serialize(&stmt, &mut NoParams);

    assert!(sql.starts_with(
        "EXEC \"dw\".sys.sp_executesql N'CREATE VIEW \"snap\".\"orders_snapshot__dbt_tmp_view\" \
         AS WITH snapshot_query AS"
    ));
    assert!(sql.contains("SELECT ''insert'' AS \"dbt_change_type\""));
}
