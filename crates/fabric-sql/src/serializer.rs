#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod flavor;
use flavor::Flavor;

mod ident;
use ident::{Ident, Literal, NLiteral};

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod catalog;
mod column_def;
mod ddl;
mod dml;
mod expr;
mod name;
mod query;
mod snapshot;
mod statement;

use fabric_core::{driver::operation::Transaction, stmt::Statement, Relation};
use name::Qualified;

/// Alias given to row-limited subqueries.
const LIMIT_ALIAS: &str = "_dbt_limit_subq";

/// Serialize a statement to a SQL string
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    /// The warehouse flavor handles the differences between SQL dialects and
    /// supported features.
    flavor: Flavor,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// Serialize a transaction control operation to a SQL string.
    pub fn serialize_transaction(&self, op: &Transaction) -> String {
        match (self.flavor, op) {
            (Flavor::Fabric, Transaction::Start) => "BEGIN TRANSACTION".to_string(),
            (Flavor::Ansi, Transaction::Start) => "BEGIN".to_string(),
            (_, Transaction::Commit) => "COMMIT".to_string(),
            (_, Transaction::Rollback) => "ROLLBACK".to_string(),
        }
    }

    /// Quotes an identifier.
    pub fn quote(&self, name: &str) -> String {
        ident::quote(name)
    }

    /// Renders a relation's fully qualified, quoted name.
    pub fn relation(&self, relation: &Relation) -> String {
        self.fragment(|f| fmt!(f, Qualified(relation)))
    }

    /// Renders a relation for use in a `FROM` clause, limited to `limit` rows.
    pub fn render_limited(&self, relation: &Relation, limit: Option<u64>) -> String {
        self.fragment(|f| match limit {
            None => fmt!(f, Qualified(relation)),
            Some(0) => fmt!(
                f,
                "(SELECT * FROM " Qualified(relation) " WHERE 1 = 0) AS " LIMIT_ALIAS
            ),
            Some(limit) => match f.serializer.flavor {
                Flavor::Fabric => fmt!(
                    f,
                    "(SELECT TOP " limit " * FROM " Qualified(relation) ") AS " LIMIT_ALIAS
                ),
                Flavor::Ansi => fmt!(
                    f,
                    "(SELECT * FROM " Qualified(relation) " LIMIT " limit ") AS " LIMIT_ALIAS
                ),
            },
        })
    }

    /// The warehouse's current time at microsecond precision.
    pub fn current_timestamp(&self) -> &'static str {
        match self.flavor {
            Flavor::Fabric => "CAST(SYSDATETIME() AS DATETIME2(6))",
            Flavor::Ansi => "CURRENT_TIMESTAMP",
        }
    }

    /// A typed null timestamp.
    pub fn null_timestamp(&self) -> &'static str {
        match self.flavor {
            Flavor::Fabric => "CAST(NULL AS DATETIME2(6))",
            Flavor::Ansi => "CAST(NULL AS TIMESTAMP)",
        }
    }

    /// A predicate that always holds. T-SQL has no boolean literal.
    pub fn always_true(&self) -> &'static str {
        match self.flavor {
            Flavor::Fabric => "1 = 1",
            Flavor::Ansi => "TRUE",
        }
    }

    /// MD5 hex digest of the given SQL expressions, NULL-safe and `|`-separated.
    pub fn hash(&self, exprs: &[String]) -> String {
        match self.flavor {
            Flavor::Fabric => {
                let parts = exprs
                    .iter()
                    .map(|expr| format!("COALESCE(CAST({expr} AS VARCHAR(8000)), '')"))
                    .collect::<Vec<_>>();

                // CONCAT requires at least two arguments.
                let input = match &parts[..] {
                    [] => "''".to_string(),
                    [single] => single.clone(),
                    _ => format!("CONCAT({})", parts.join(", '|', ")),
                };
                format!("CONVERT(VARCHAR(32), HASHBYTES('MD5', {input}), 2)")
            }
            Flavor::Ansi => {
                let parts = exprs
                    .iter()
                    .map(|expr| format!("COALESCE(CAST({expr} AS VARCHAR), '')"))
                    .collect::<Vec<_>>();
                let input = if parts.is_empty() {
                    "''".to_string()
                } else {
                    parts.join(" || '|' || ")
                };
                format!("MD5({input})")
            }
        }
    }

    /// Renders a fragment that never binds parameters.
    fn fragment(
        &self,
        build: impl FnOnce(&mut Formatter<'_, Vec<fabric_core::stmt::Value>>),
    ) -> String {
        let mut dst = String::new();
        let mut params = vec![];
        let mut f = Formatter {
            serializer: self,
            dst: &mut dst,
            params: &mut params,
        };
        build(&mut f);
        dst
    }
}

impl<P: Params> Formatter<'_, P> {
    /// Renders `build` into a separate buffer that shares this formatter's
    /// parameters.
    fn nested(&mut self, build: impl FnOnce(&mut Formatter<'_, P>)) -> String {
        let mut dst = String::new();
        let mut nested = Formatter {
            serializer: self.serializer,
            dst: &mut dst,
            params: &mut *self.params,
        };
        build(&mut nested);
        dst
    }

    fn is_fabric(&self) -> bool {
        self.serializer.flavor == Flavor::Fabric
    }
}

/// `EXEC "database".sys.sp_executesql N'...'`
///
/// Fabric only accepts some DDL as the first statement of a batch and never
/// with a database prefix on the object, so the statement runs inside the
/// target database instead.
struct InDatabase<'a> {
    database: &'a str,
    sql: String,
}

impl ToSql for InDatabase<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "EXEC " Ident(self.database) ".sys.sp_executesql " NLiteral(&self.sql));
    }
}
