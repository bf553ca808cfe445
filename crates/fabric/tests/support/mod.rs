#![allow(dead_code)]

use fabric::{Adapter, AdapterConfig, Dialect, Relation};
use fabric_core::stmt::Value;
use fabric_driver_memory::Memory;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A Fabric warehouse and an adapter connected to it.
pub fn fabric() -> (Memory, Adapter) {
    connect(Memory::fabric(), Dialect::Fabric)
}

/// A warehouse with every capability and an adapter connected to it.
pub fn ansi() -> (Memory, Adapter) {
    connect(Memory::ansi(), Dialect::Ansi)
}

fn connect(memory: Memory, dialect: Dialect) -> (Memory, Adapter) {
    init_tracing();

    let config = AdapterConfig {
        dialect,
        run_id: Some("run-1".to_string()),
        ..AdapterConfig::default()
    };
    let adapter = Adapter::new(memory.clone(), &config);
    (memory, adapter)
}

pub fn table(name: &str) -> Relation {
    Relation::table("dw", "dbo", name).unwrap()
}

pub fn view(name: &str) -> Relation {
    Relation::view("dw", "dbo", name).unwrap()
}

pub fn int(value: i64) -> Value {
    Value::I64(value)
}

pub fn text(value: &str) -> Value {
    Value::from(value)
}

/// First column of every row, as integers.
pub fn ids(rows: &[Vec<Value>]) -> Vec<i64> {
    rows.iter().filter_map(|row| row[0].to_i64()).collect()
}
