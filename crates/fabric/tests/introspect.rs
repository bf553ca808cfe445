mod support;
use support::*;

use fabric::{RunId, MAX_DEPENDENCY_DEPTH};
use fabric_core::{stmt::Statement, Column};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn relations_report_their_catalog_kind() {
    let (memory, mut adapter) = fabric();
    memory.create_table(&table("orders"), vec![Column::new("id", "int")], vec![]);
    memory.create_view(&view("orders_v"), &table("orders"));

    assert_eq!(
        adapter.list_relations("dw", "dbo").await.unwrap(),
        [table("orders"), view("orders_v")]
    );
    // Looked up as a table, found as the view it is.
    assert_eq!(
        adapter.get_relation(&table("orders_v")).await.unwrap(),
        Some(view("orders_v"))
    );
    assert_eq!(adapter.get_relation(&table("missing")).await.unwrap(), None);
}

#[tokio::test]
async fn duplicate_catalog_entries_are_reported() {
    let (memory, mut adapter) = fabric();
    memory.create_table(&table("orders"), vec![Column::new("id", "int")], vec![]);
    memory.duplicate_catalog_entry(&table("orders"));

    let err = adapter.get_relation(&table("orders")).await.unwrap_err();

    assert!(err.is_ambiguous_catalog());
}

#[tokio::test]
async fn columns_carry_sizes_and_nullability() {
    let (memory, mut adapter) = fabric();
    memory.create_table(
        &table("orders"),
        vec![
            Column::new("id", "int").not_null(),
            Column::new("name", "varchar").with_char_size(50),
        ],
        vec![],
    );

    let columns = adapter.columns_of(&table("orders")).await.unwrap();

    assert_eq!(columns[0].name, "id");
    assert!(!columns[0].nullable);
    assert_eq!(columns[1].char_size, Some(50));
    assert_eq!(columns[1].data_type(), "varchar(50)");
}

#[tokio::test]
async fn leftovers_from_earlier_runs_are_found() {
    let (memory, mut adapter) = fabric();
    let old = RunId::new("old");
    memory.create_table(&table("orders"), vec![Column::new("id", "int")], vec![]);
    memory.create_table(&table("orders").as_temp(&old), vec![Column::new("id", "int")], vec![]);
    memory.create_table(&table("orders").as_backup(&old), vec![Column::new("id", "int")], vec![]);

    let orphans = adapter.orphaned_relations("dw", "dbo").await.unwrap();

    assert_eq!(
        orphans,
        [table("orders").as_temp(&old), table("orders").as_backup(&old)]
    );
}

#[tokio::test]
async fn dropping_a_view_walks_its_dependents() {
    let (memory, mut adapter) = fabric();
    memory.create_table(&table("orders"), vec![Column::new("id", "int")], vec![]);
    memory.create_view(&view("base"), &table("orders"));
    memory.create_view(&view("left"), &view("base"));
    memory.create_view(&view("right"), &view("base"));
    memory.create_view(&view("top"), &view("left"));

    adapter.drop_if_exists(&view("base")).await.unwrap();

    assert_eq!(memory.relations("dw", "dbo"), [table("orders")]);
    let dropped = memory
        .statements()
        .into_iter()
        .filter(|stmt| matches!(stmt, Statement::DropRelation(_)))
        .count();
    assert_eq!(dropped, 4);
}

#[tokio::test]
async fn dependency_chains_past_the_depth_cap_fail() {
    let (memory, mut adapter) = fabric();
    memory.create_table(&table("orders"), vec![Column::new("id", "int")], vec![]);
    memory.create_view(&view("v0"), &table("orders"));
    for level in 1..=MAX_DEPENDENCY_DEPTH + 8 {
        memory.create_view(&view(&format!("v{level}")), &view(&format!("v{}", level - 1)));
    }

    let err = adapter.drop_if_exists(&view("v0")).await.unwrap_err();

    assert!(err.is_dependency_cycle());
    assert!(memory.exists(&view("v0")));
    assert!(!memory
        .statements()
        .iter()
        .any(|stmt| matches!(stmt, Statement::DropRelation(_))));
}

#[tokio::test]
async fn view_cycles_are_detected() {
    let (memory, mut adapter) = fabric();
    memory.create_view(&view("a"), &view("b"));
    memory.create_view(&view("b"), &view("a"));

    let err = adapter.drop_if_exists(&view("a")).await.unwrap_err();

    assert!(err.is_dependency_cycle());
    assert!(memory.exists(&view("a")));
    assert!(memory.exists(&view("b")));
}
