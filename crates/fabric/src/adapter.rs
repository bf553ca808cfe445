use fabric_core::{
    driver::{
        operation::{QuerySql, Transaction},
        Capability, Connection, ResultSet,
    },
    err,
    stmt::{Statement, Value},
    AdapterConfig, Result, RunId,
};
use fabric_sql::Serializer;
use tracing::{debug, warn};

/// A session materializing models into one warehouse.
///
/// The dialect is resolved when the adapter is built: every later decision
/// reads the resolved [`Capability`] and [`Serializer`] instead of asking
/// which warehouse it talks to.
#[derive(Debug)]
pub struct Adapter {
    connection: Box<dyn Connection>,
    capability: &'static Capability,
    serializer: Serializer,
    run_id: RunId,
    query_comment: Option<String>,
}

impl Adapter {
    pub fn new(connection: impl Connection, config: &AdapterConfig) -> Adapter {
        let run_id = match &config.run_id {
            Some(run_id) => RunId::new(run_id.clone()),
            None => RunId::generate(),
        };

        Adapter {
            connection: Box::new(connection),
            capability: Capability::for_dialect(config.dialect),
            serializer: Serializer::for_dialect(config.dialect),
            run_id,
            query_comment: config.query_comment.clone(),
        }
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Identifies this adapter's scratch relations.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Runs a statement and returns the number of rows it affected.
    pub async fn execute(&mut self, stmt: impl Into<Statement>) -> Result<u64> {
        self.exec(stmt.into(), false).await
    }

    /// Runs a query and returns its rows.
    pub async fn fetch(&mut self, stmt: impl Into<Statement>) -> Result<ResultSet> {
        let stmt = stmt.into();
        let mut params = vec![];
        let sql = self.render(&stmt, &mut params);
        let response = self.send(stmt, sql, params, true).await?;
        response.rows.into_values()
    }

    /// Runs statements in order, inside one transaction when the warehouse
    /// supports multi-statement transactions. Returns each statement's row
    /// count.
    pub(crate) async fn execute_all(&mut self, stmts: Vec<Statement>) -> Result<Vec<u64>> {
        if !self.capability.multi_statement_transactions {
            let mut counts = Vec::with_capacity(stmts.len());
            for stmt in stmts {
                counts.push(self.execute(stmt).await?);
            }
            return Ok(counts);
        }

        self.transaction(Transaction::Start).await?;

        let mut counts = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            match self.execute(stmt).await {
                Ok(count) => counts.push(count),
                Err(err) => {
                    if let Err(rollback) = self.transaction(Transaction::Rollback).await {
                        warn!(error = %rollback, "rollback failed");
                    }
                    return Err(err);
                }
            }
        }

        self.transaction(Transaction::Commit).await?;
        Ok(counts)
    }

    async fn transaction(&mut self, op: Transaction) -> Result<()> {
        debug!(sql = %self.serializer.serialize_transaction(&op), "transaction");
        self.connection.exec(op.into()).await?;
        Ok(())
    }

    async fn exec(&mut self, stmt: Statement, fetch: bool) -> Result<u64> {
        let mut params = vec![];
        let sql = self.render(&stmt, &mut params);
        let response = self.send(stmt, sql, params, fetch).await?;
        response.rows.into_count()
    }

    fn render(&self, stmt: &Statement, params: &mut Vec<Value>) -> String {
        let sql = self.serializer.serialize(stmt, params);
        match &self.query_comment {
            Some(comment) => format!("/* {} */ {sql}", comment.replace("*/", "* /")),
            None => sql,
        }
    }

    async fn send(
        &mut self,
        stmt: Statement,
        sql: String,
        params: Vec<Value>,
        fetch: bool,
    ) -> Result<fabric_core::driver::Response> {
        debug!(
            statement = stmt.name(),
            sql = %sql,
            params = params.len(),
            "executing statement"
        );

        let target = stmt.target().map(|relation| relation.to_string());
        let name = stmt.name();

        self.connection
            .exec(
                QuerySql {
                    stmt,
                    sql,
                    params,
                    fetch,
                }
                .into(),
            )
            .await
            .map_err(|cause| match target {
                Some(target) => cause.context(err!("{name} on {target} failed")),
                None => cause.context(err!("{name} failed")),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::Dialect;

    #[derive(Debug)]
    struct Unreachable;

    #[fabric_core::async_trait]
    impl Connection for Unreachable {
        async fn exec(
            &mut self,
            _op: fabric_core::driver::Operation,
        ) -> Result<fabric_core::driver::Response> {
            Err(fabric_core::Error::warehouse("unreachable"))
        }
    }

    #[test]
    fn dialect_is_resolved_at_construction() {
        let adapter = Adapter::new(
            Unreachable,
            &AdapterConfig {
                dialect: Dialect::Ansi,
                run_id: Some("run".to_string()),
                query_comment: None,
            },
        );
        assert!(adapter.capability().alter_add_column);
        assert!(!adapter.serializer().is_fabric());
        assert_eq!(adapter.run_id().as_str(), "run");

        let adapter = Adapter::new(Unreachable, &AdapterConfig::default());
        assert!(!adapter.capability().truncate);
        assert!(adapter.serializer().is_fabric());
    }

    #[test]
    fn query_comment_is_prefixed_and_cannot_close_early() {
        let adapter = Adapter::new(
            Unreachable,
            &AdapterConfig {
                query_comment: Some("job */ 42".to_string()),
                ..AdapterConfig::default()
            },
        );
        let sql = adapter.render(&fabric_core::stmt::Query::sql("SELECT 1").into(), &mut vec![]);
        assert_eq!(sql, "/* job * / 42 */ SELECT 1;");
    }
}
