use super::{Query, Statement};
use crate::Relation;

/// Catalog lookups. Each names its database explicitly; none relies on the
/// session's current database.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalog {
    /// Rows of `(name, kind)` for a schema, optionally narrowed to one identifier.
    Relations {
        database: String,
        schema: String,
        identifier: Option<String>,
    },

    /// Rows of `(name, data_type, char_size, numeric_precision,
    /// numeric_scale, is_nullable)` in ordinal order.
    Columns(Relation),

    /// Rows of `(schema_name, view_name)` for views referencing the relation.
    ViewDependents(Relation),

    /// Rows of `(grantee, privilege_type)`.
    Grants(Relation),
}

impl Catalog {
    pub fn relations(database: &str, schema: &str) -> Catalog {
        Catalog::Relations {
            database: database.to_string(),
            schema: schema.to_string(),
            identifier: None,
        }
    }

    pub fn relation(relation: &Relation) -> Catalog {
        Catalog::Relations {
            database: relation.database().to_string(),
            schema: relation.schema().to_string(),
            identifier: Some(relation.identifier().to_string()),
        }
    }
}

impl From<Catalog> for Query {
    fn from(value: Catalog) -> Query {
        Query::Catalog(value)
    }
}

impl From<Catalog> for Statement {
    fn from(value: Catalog) -> Statement {
        Statement::Query(value.into())
    }
}
