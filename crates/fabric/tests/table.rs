mod support;
use support::*;

use fabric::{Materialization, Model, ModelConfig, RunId, State};
use fabric_core::{stmt::Statement, Column};
use fabric_driver_memory::{Data, Memory};
use pretty_assertions::assert_eq;
use serde_json::json;

const SQL: &str = "select id, name from staging.orders";

fn orders_data(rows: Vec<Vec<fabric_core::stmt::Value>>) -> Data {
    Data::new(
        vec![
            Column::new("id", "int"),
            Column::new("name", "varchar").with_char_size(50),
        ],
        rows,
    )
}

fn model(config: ModelConfig) -> Model {
    Model::new(table("orders"), SQL, config)
}

fn seed_existing(memory: &Memory) {
    memory.create_table(
        &table("orders"),
        vec![Column::new("id", "int"), Column::new("name", "varchar")],
        vec![vec![int(9), text("stale")]],
    );
}

#[tokio::test]
async fn builds_then_rebuilds_without_leftovers() {
    let (memory, mut adapter) = fabric();
    memory.register_query(SQL, orders_data(vec![vec![int(1), text("a")], vec![int(2), text("b")]]));

    let built = adapter
        .materialize(&model(ModelConfig::new(Materialization::Table)))
        .await
        .unwrap();
    assert_eq!(built.relations, [table("orders")]);
    assert_eq!(built.rows_affected, Some(2));
    assert_eq!(
        built.history,
        [State::Absent, State::Staging, State::Publishing, State::Committed]
    );

    memory.register_query(SQL, orders_data(vec![vec![int(3), text("c")]]));
    let rebuilt = adapter
        .materialize(&model(ModelConfig::new(Materialization::Table)))
        .await
        .unwrap();

    assert_eq!(rebuilt.rows_affected, Some(1));
    assert_eq!(memory.rows(&table("orders")).unwrap(), [vec![int(3), text("c")]]);
    assert_eq!(memory.relations("dw", "dbo"), [table("orders")]);
}

#[tokio::test]
async fn failed_publish_reports_the_retained_backup() {
    let (memory, mut adapter) = fabric();
    seed_existing(&memory);
    memory.register_query(SQL, orders_data(vec![vec![int(1), text("a")]]));
    memory.fail_when(
        |stmt| {
            matches!(stmt, Statement::RenameRelation(rename) if rename.to.identifier() == "orders")
        },
        "rename failed",
    );

    let err = adapter
        .materialize(&model(ModelConfig::new(Materialization::Table)))
        .await
        .unwrap_err();

    let run = RunId::new("run-1");
    let backup = table("orders").as_backup(&run);
    assert!(err.is_backup_retained());
    assert_eq!(err.backup(), Some(&backup));

    assert!(memory.exists(&backup));
    assert!(!memory.exists(&table("orders")));
    assert!(!memory.exists(&table("orders").as_temp(&run)));
    assert_eq!(memory.rows(&backup).unwrap(), [vec![int(9), text("stale")]]);
}

#[tokio::test]
async fn enforced_contract_declares_columns_and_constraints() {
    let (memory, mut adapter) = fabric();
    memory.register_query(SQL, orders_data(vec![vec![int(1), text("a")]]));

    let config = ModelConfig::from_json(json!({
        "materialized": "table",
        "contract": { "enforced": true },
        "columns": {
            "id": { "data_type": "int", "constraints": [
                { "type": "not_null" },
                { "type": "primary_key" },
            ]},
            "name": { "data_type": "varchar(50)" },
        },
    }))
    .unwrap();

    let built = adapter.materialize(&model(config)).await.unwrap();

    assert_eq!(
        built.history,
        [
            State::Absent,
            State::Staging,
            State::Validating,
            State::Publishing,
            State::Committed
        ]
    );
    assert_eq!(memory.constraints(&table("orders")), ["pk_orders_id"]);
    assert_eq!(memory.rows(&table("orders")).unwrap(), [vec![int(1), text("a")]]);

    let id = &memory.data(&table("orders")).unwrap().columns[0];
    assert!(!id.nullable);
}

#[tokio::test]
async fn contract_mismatch_leaves_no_scratch_relations() {
    let (memory, mut adapter) = fabric();
    memory.register_query(SQL, orders_data(vec![vec![int(1), text("a")]]));

    let config = ModelConfig::from_json(json!({
        "materialized": "table",
        "contract": { "enforced": true },
        "columns": {
            "id": { "data_type": "bigint" },
            "name": { "data_type": "varchar(50)" },
        },
    }))
    .unwrap();

    let err = adapter.materialize(&model(config)).await.unwrap_err();

    assert!(err.is_contract_mismatch());
    assert!(err.to_string().contains("declared bigint, query returns int"));
    assert!(memory.relations("dw", "dbo").is_empty());
}

#[tokio::test]
async fn nested_ctes_under_a_contract_are_rejected_before_any_statement() {
    let (memory, mut adapter) = fabric();
    let sql = "with a as (with b as (select 1 as id) select * from b) select * from a";

    let config = ModelConfig::from_json(json!({
        "materialized": "table",
        "contract": { "enforced": true },
        "columns": { "id": { "data_type": "int" } },
    }))
    .unwrap();

    let err = adapter
        .materialize(&Model::new(table("orders"), sql, config))
        .await
        .unwrap_err();

    assert!(err.is_capability_violation());
    assert!(memory.statements().is_empty());
}

#[tokio::test]
async fn ctes_are_staged_behind_a_view_on_fabric() {
    let (memory, mut adapter) = fabric();
    let sql = "with recent as (select * from staging.orders) select * from recent";
    memory.register_query(sql, orders_data(vec![vec![int(1), text("a")]]));

    adapter
        .materialize(&Model::new(
            table("orders"),
            sql,
            ModelConfig::new(Materialization::Table),
        ))
        .await
        .unwrap();

    assert_eq!(memory.rows(&table("orders")).unwrap(), [vec![int(1), text("a")]]);
    assert!(memory.statements().iter().any(|stmt| matches!(
        stmt,
        Statement::CreateView(create) if create.relation.is_derived()
    )));
}

#[tokio::test]
async fn grants_follow_the_configuration_on_rebuild() {
    let (memory, mut adapter) = fabric();
    seed_existing(&memory);
    memory.register_query(SQL, orders_data(vec![vec![int(1), text("a")]]));

    let config = ModelConfig::from_json(json!({
        "materialized": "table",
        "grants": { "select": ["analyst", "bi"] },
    }))
    .unwrap();
    adapter.materialize(&model(config)).await.unwrap();

    assert_eq!(
        memory.grants(&table("orders")),
        [
            ("select".to_string(), "analyst".to_string()),
            ("select".to_string(), "bi".to_string())
        ]
    );
}
