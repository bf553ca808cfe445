mod support;
use support::*;

use fabric::{Materialization, Model, ModelConfig, RunId, State};
use fabric_core::{stmt::Statement, Column};
use fabric_driver_memory::Memory;
use pretty_assertions::assert_eq;
use serde_json::json;

const SQL: &str = "select * from dw.dbo.orders";

fn orders(memory: &Memory) {
    memory.create_table(
        &table("orders"),
        vec![Column::new("id", "int")],
        vec![vec![int(1)], vec![int(2)]],
    );
    memory.register_select(SQL, &table("orders"));
}

fn model(config: ModelConfig) -> Model {
    Model::new(view("orders_v"), SQL, config)
}

fn dropped(memory: &Memory) -> Vec<String> {
    memory
        .statements()
        .into_iter()
        .filter_map(|stmt| match stmt {
            Statement::DropRelation(drop) => Some(drop.relation.identifier().to_string()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn creates_a_missing_view() {
    let (memory, mut adapter) = fabric();
    orders(&memory);

    let built = adapter
        .materialize(&model(ModelConfig::new(Materialization::View)))
        .await
        .unwrap();

    assert_eq!(built.relations, [view("orders_v")]);
    assert_eq!(built.rows_affected, None);
    assert_eq!(
        built.history,
        [State::Absent, State::Staging, State::Publishing, State::Committed]
    );
    assert_eq!(ids(&memory.rows(&view("orders_v")).unwrap()), [1, 2]);
}

#[tokio::test]
async fn swapping_on_fabric_drops_dependents_leaves_first() {
    let (memory, mut adapter) = fabric();
    orders(&memory);
    memory.create_view(&view("orders_v"), &table("orders"));
    memory.create_view(&view("child"), &view("orders_v"));
    memory.create_view(&view("grandchild"), &view("child"));
    memory.clear_log();

    adapter
        .materialize(&model(ModelConfig::new(Materialization::View)))
        .await
        .unwrap();

    let backup = view("orders_v").as_backup(&RunId::new("run-1"));
    assert_eq!(
        dropped(&memory),
        ["grandchild".to_string(), "child".to_string(), backup.identifier().to_string()]
    );
    assert!(memory.statements().iter().all(|stmt| match stmt {
        Statement::DropRelation(drop) => !drop.cascade,
        _ => true,
    }));
    assert_eq!(memory.relations("dw", "dbo"), [table("orders"), view("orders_v")]);
}

#[tokio::test]
async fn replaces_in_place_when_the_warehouse_can() {
    let (memory, mut adapter) = ansi();
    orders(&memory);
    memory.create_view(&view("orders_v"), &table("orders"));
    memory.grant(&view("orders_v"), "select", "analyst");
    memory.clear_log();

    let config = ModelConfig::from_json(json!({
        "materialized": "view",
        "grants": { "select": "bi" },
    }))
    .unwrap();
    adapter.materialize(&model(config)).await.unwrap();

    let stmts = memory.statements();
    assert!(stmts.iter().any(|stmt| matches!(
        stmt,
        Statement::CreateView(create) if create.or_replace && create.relation == view("orders_v")
    )));
    assert!(!stmts
        .iter()
        .any(|stmt| matches!(stmt, Statement::RenameRelation(_))));
    assert_eq!(
        memory.grants(&view("orders_v")),
        [("select".to_string(), "bi".to_string())]
    );
}

#[tokio::test]
async fn a_table_under_the_name_is_swapped_for_the_view() {
    let (memory, mut adapter) = fabric();
    orders(&memory);
    memory.create_table(&table("orders_v"), vec![Column::new("id", "int")], vec![]);

    adapter
        .materialize(&model(ModelConfig::new(Materialization::View)))
        .await
        .unwrap();

    assert_eq!(memory.relations("dw", "dbo"), [table("orders"), view("orders_v")]);
    assert_eq!(ids(&memory.rows(&view("orders_v")).unwrap()), [1, 2]);
}
