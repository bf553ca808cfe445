mod support;
use support::*;

use fabric::{Model, ModelConfig, TestOutcome};
use fabric_core::{stmt::Value, Column, RelationKind};
use fabric_driver_memory::{Data, Memory};
use pretty_assertions::assert_eq;
use serde_json::json;

const SQL: &str = "select * from dw.dbo.orders where id is null";

fn failing_rows(memory: &Memory, count: usize) {
    let rows = (0..count)
        .map(|index| vec![Value::Null, text(&format!("order {index}"))])
        .collect();
    memory.register_query(
        SQL,
        Data::new(
            vec![Column::new("id", "int"), Column::new("name", "varchar")],
            rows,
        ),
    );
}

fn model(config: serde_json::Value) -> Model {
    let mut config = config;
    config["materialized"] = json!("test");
    Model::new(
        table("not_null_orders_id"),
        SQL,
        ModelConfig::from_json(config).unwrap(),
    )
}

#[tokio::test]
async fn passing_test_clears_stored_failures() {
    let (memory, mut adapter) = fabric();
    failing_rows(&memory, 0);
    memory.create_table(
        &table("not_null_orders_id"),
        vec![Column::new("id", "int")],
        vec![vec![Value::Null]],
    );

    let outcome = adapter
        .run_test(&model(json!({ "store_failures": true })))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        TestOutcome {
            failures: 0,
            should_warn: false,
            should_error: false,
            relation: None,
        }
    );
    assert!(memory.relations("dw", "dbo").is_empty());
}

#[tokio::test]
async fn failures_are_stored_as_a_table() {
    let (memory, mut adapter) = fabric();
    failing_rows(&memory, 2);

    let outcome = adapter
        .run_test(&model(json!({ "store_failures": true, "severity": "warn" })))
        .await
        .unwrap();

    assert_eq!(outcome.failures, 2);
    assert!(outcome.should_warn);
    assert!(!outcome.should_error);
    assert_eq!(outcome.relation, Some(table("not_null_orders_id")));
    assert_eq!(memory.rows(&table("not_null_orders_id")).unwrap().len(), 2);
    assert_eq!(memory.relations("dw", "dbo"), [table("not_null_orders_id")]);
}

#[tokio::test]
async fn failures_can_be_stored_as_a_view() {
    let (memory, mut adapter) = fabric();
    failing_rows(&memory, 1);

    let outcome = adapter
        .run_test(&model(json!({ "store_failures": true, "store_failures_as": "view" })))
        .await
        .unwrap();

    let stored = outcome.relation.unwrap();
    assert_eq!(stored.kind(), RelationKind::View);
    assert_eq!(memory.rows(&stored).unwrap().len(), 1);
}

#[tokio::test]
async fn thresholds_decide_warn_and_error() {
    let (memory, mut adapter) = fabric();
    failing_rows(&memory, 3);

    let outcome = adapter
        .run_test(&model(json!({ "warn_if": ">= 2", "error_if": "> 5" })))
        .await
        .unwrap();
    assert!(outcome.should_warn);
    assert!(!outcome.should_error);

    let outcome = adapter
        .run_test(&model(json!({ "error_if": "!= 0" })))
        .await
        .unwrap();
    assert!(outcome.should_error);
    assert_eq!(outcome.relation, None);
    assert!(memory.relations("dw", "dbo").is_empty());
}

#[tokio::test]
async fn limit_caps_the_failure_count() {
    let (memory, mut adapter) = fabric();
    failing_rows(&memory, 3);

    let outcome = adapter
        .run_test(&model(json!({ "limit": 1 })))
        .await
        .unwrap();

    assert_eq!(outcome.failures, 1);
}

#[tokio::test]
async fn tests_are_not_materialized_as_models() {
    let (_, mut adapter) = fabric();

    let err = adapter.materialize(&model(json!({}))).await.unwrap_err();

    assert!(err.is_invalid_config());
}
