use crate::{stmt::Value, Error, Result};

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, fully buffered
    Values(ResultSet),
}

/// Rows returned by a query, with column names in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(values: ResultSet) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }

    pub fn empty_values() -> Self {
        Self::values(ResultSet::default())
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Rows::Count(count) => Ok(count),
            Rows::Values(values) => Ok(values.rows.len() as u64),
        }
    }

    pub fn into_values(self) -> Result<ResultSet> {
        match self {
            Rows::Values(values) => Ok(values),
            Rows::Count(count) => Err(Error::invalid_result(format!(
                "expected rows, got a count of {count}"
            ))),
        }
    }
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> ResultSet {
        ResultSet { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Position of `name` in the select list, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::invalid_result(format!(
                    "result has no column `{name}` (columns: {})",
                    self.columns.join(", ")
                ))
            })
    }

    /// Value of `name` in row `row`.
    pub fn get(&self, row: usize, name: &str) -> Result<&Value> {
        let index = self.column_index(name)?;
        self.rows
            .get(row)
            .and_then(|values| values.get(index))
            .ok_or_else(|| Error::invalid_result(format!("row {row} has no value for `{name}`")))
    }
}
