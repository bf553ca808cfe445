use super::{Expr, Query, Statement};
use crate::Relation;

/// A single-relation `SELECT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub from: Relation,

    /// Projection; empty selects every column.
    pub items: Vec<SelectItem>,

    pub filter: Option<Expr>,

    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// The column itself.
    Column(String),

    /// The column cast to another type, keeping its name.
    Cast { column: String, data_type: String },

    /// A typed `NULL` under the given name.
    Null { column: String, data_type: String },
}

impl SelectItem {
    pub fn name(&self) -> &str {
        match self {
            SelectItem::Column(column) => column,
            SelectItem::Cast { column, .. } => column,
            SelectItem::Null { column, .. } => column,
        }
    }
}

impl Select {
    pub fn star(from: &Relation) -> Select {
        Select {
            from: from.clone(),
            items: vec![],
            filter: None,
            limit: None,
        }
    }

    pub fn columns<I, S>(from: &Relation, columns: I) -> Select
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Select {
            items: columns
                .into_iter()
                .map(|column| SelectItem::Column(column.into()))
                .collect(),
            ..Select::star(from)
        }
    }

    pub fn with_items(mut self, items: Vec<SelectItem>) -> Select {
        self.items = items;
        self
    }

    pub fn with_filter(mut self, filter: Expr) -> Select {
        self.filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Select {
        self.limit = limit;
        self
    }
}

impl From<Select> for Query {
    fn from(value: Select) -> Query {
        Query::Select(value)
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Statement {
        Statement::Query(value.into())
    }
}
