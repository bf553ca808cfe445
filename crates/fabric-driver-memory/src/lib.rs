//! An in-memory warehouse for exercising materializations without a server.
//!
//! Statements are interpreted from their IR rather than parsed from SQL. The
//! warehouse enforces the gaps described by its [`Capability`]: on the Fabric
//! profile it rejects `ALTER TABLE ... ADD/DROP COLUMN`, `TRUNCATE`,
//! renames across schemas, dropping a view other views depend on, and
//! statements carrying more parameters than a request allows.

mod eval;
mod snapshot;
mod warehouse;

pub use warehouse::Data;
use warehouse::{Object, Warehouse};

use fabric_core::{
    async_trait,
    driver::{
        operation::{Operation, Transaction},
        Capability, Connection, Response,
    },
    schema::Column,
    stmt::{Statement, Value},
    Relation, Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to a shared in-memory warehouse. Clones observe the same state, so
/// a test can hand one clone to the adapter and inspect through another.
#[derive(Clone)]
pub struct Memory {
    inner: Arc<Mutex<Warehouse>>,
}

impl Memory {
    /// A warehouse with Fabric's capability gaps.
    pub fn fabric() -> Memory {
        Memory::with_capability(&Capability::FABRIC)
    }

    /// A warehouse supporting the full ANSI feature set.
    pub fn ansi() -> Memory {
        Memory::with_capability(&Capability::ANSI)
    }

    pub fn with_capability(capability: &'static Capability) -> Memory {
        Memory {
            inner: Arc::new(Mutex::new(Warehouse::new(capability))),
        }
    }

    /// Registers the result of a model query. A statement embedding exactly
    /// this SQL (ignoring surrounding whitespace and a trailing `;`) yields
    /// `data`.
    pub fn register_query(&self, sql: &str, data: Data) {
        self.lock().register_static(sql, data);
    }

    /// Registers a model query that reads `relation` in full. The result
    /// follows later changes to the relation, and views defined by the query
    /// depend on it.
    pub fn register_select(&self, sql: &str, relation: &Relation) {
        self.lock().register_select(sql, relation);
    }

    pub fn create_table(&self, relation: &Relation, columns: Vec<Column>, rows: Vec<Vec<Value>>) {
        self.lock()
            .insert_object(Object::table(relation, columns, rows));
    }

    /// Creates a view whose rows are those of `reads`.
    pub fn create_view(&self, relation: &Relation, reads: &Relation) {
        self.lock().insert_object(Object::view_of(relation, reads));
    }

    pub fn grant(&self, relation: &Relation, privilege: &str, grantee: &str) {
        self.lock().grant(relation, privilege, grantee);
    }

    /// Fails every statement matching `predicate` with a warehouse error.
    pub fn fail_when(
        &self,
        predicate: impl Fn(&Statement) -> bool + Send + 'static,
        message: impl Into<String>,
    ) {
        self.lock().fail_when(Box::new(predicate), message.into());
    }

    /// Sets the value `CURRENT_TIMESTAMP` evaluates to.
    pub fn set_now(&self, now: impl Into<String>) {
        self.lock().now = now.into();
    }

    /// Makes catalog listings report `relation` twice.
    pub fn duplicate_catalog_entry(&self, relation: &Relation) {
        self.lock().duplicates.push(relation.clone());
    }

    pub fn exists(&self, relation: &Relation) -> bool {
        self.lock().get(relation).is_some()
    }

    /// Every relation in `database.schema`, in creation order.
    pub fn relations(&self, database: &str, schema: &str) -> Vec<Relation> {
        self.lock()
            .objects
            .values()
            .map(|object| object.relation.clone())
            .filter(|relation| relation.database() == database && relation.schema() == schema)
            .collect()
    }

    /// The relation's columns and rows, evaluating views.
    pub fn data(&self, relation: &Relation) -> Result<Data> {
        self.lock().read(relation)
    }

    pub fn rows(&self, relation: &Relation) -> Result<Vec<Vec<Value>>> {
        Ok(self.data(relation)?.rows)
    }

    pub fn column_names(&self, relation: &Relation) -> Result<Vec<String>> {
        Ok(self
            .data(relation)?
            .columns
            .into_iter()
            .map(|column| column.name)
            .collect())
    }

    /// `(privilege, grantee)` pairs on the relation.
    pub fn grants(&self, relation: &Relation) -> Vec<(String, String)> {
        self.lock()
            .get(relation)
            .map(|object| object.grants.clone())
            .unwrap_or_default()
    }

    /// Names of the constraints attached to a table.
    pub fn constraints(&self, relation: &Relation) -> Vec<String> {
        self.lock()
            .get(relation)
            .map(|object| {
                object
                    .constraints
                    .iter()
                    .map(|constraint| constraint.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Statements executed so far, in order. Failed statements are included.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    /// SQL text executed so far, including transaction control.
    pub fn sql_log(&self) -> Vec<String> {
        self.lock().sql_log.clone()
    }

    pub fn clear_log(&self) {
        let mut warehouse = self.lock();
        warehouse.statements.clear();
        warehouse.sql_log.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Warehouse> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for Memory {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        let mut warehouse = self.lock();

        match op {
            Operation::QuerySql(op) => {
                tracing::trace!(sql = %op.sql, "memory warehouse exec");
                warehouse.sql_log.push(op.sql);
                warehouse.statements.push(op.stmt.clone());
                warehouse.exec(&op.stmt, op.params.len(), op.fetch)
            }
            Operation::Transaction(op) => {
                warehouse.sql_log.push(
                    match op {
                        Transaction::Start => "BEGIN",
                        Transaction::Commit => "COMMIT",
                        Transaction::Rollback => "ROLLBACK",
                    }
                    .to_string(),
                );
                warehouse.transaction(op)?;
                Ok(Response::count(0))
            }
        }
    }
}
