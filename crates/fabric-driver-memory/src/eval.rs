use crate::warehouse::{normalize, Data, Registered, Warehouse};

use fabric_core::{
    driver::ResultSet,
    schema::Column,
    stmt::{BinaryOp, Catalog, Expr, ExprColumn, Query, Scope, Select, SelectItem, Value},
    Error, Relation, Result,
};
use std::cmp::Ordering;

/// One row and the columns describing it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Row<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub(crate) fn new(columns: &'a [Column], values: &'a [Value]) -> Row<'a> {
        Row { columns, values }
    }

    fn get(&self, name: &str) -> Result<&'a Value> {
        let index = crate::warehouse::position(self.columns, name)?;
        self.values
            .get(index)
            .ok_or_else(|| Error::warehouse(format!("row has no value for '{name}'")))
    }
}

/// Rows visible to an expression.
pub(crate) struct Env<'a> {
    target: Option<Row<'a>>,
    source: Option<Row<'a>>,
    now: &'a str,
}

impl<'a> Env<'a> {
    pub(crate) fn target(target: Row<'a>, now: &'a str) -> Env<'a> {
        Env {
            target: Some(target),
            source: None,
            now,
        }
    }

    pub(crate) fn both(target: Row<'a>, source: Row<'a>, now: &'a str) -> Env<'a> {
        Env {
            target: Some(target),
            source: Some(source),
            now,
        }
    }

    /// True when every predicate holds.
    pub(crate) fn all(&self, predicates: &[Expr]) -> Result<bool> {
        for predicate in predicates {
            if !self.holds(predicate)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn holds(&self, expr: &Expr) -> Result<bool> {
        Ok(matches!(self.eval(expr)?, Value::Bool(true)))
    }

    fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::And(exprs) => Ok(Value::Bool(self.all(exprs)?)),
            Expr::BinaryOp(binary) => {
                let lhs = self.eval(&binary.lhs)?;
                let rhs = self.eval(&binary.rhs)?;
                let Some(ordering) = compare(&lhs, &rhs) else {
                    return Ok(Value::Null);
                };
                Ok(Value::Bool(match binary.op {
                    BinaryOp::Eq => ordering == Ordering::Equal,
                    BinaryOp::Ne => ordering != Ordering::Equal,
                    BinaryOp::Ge => ordering != Ordering::Less,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Lt => ordering == Ordering::Less,
                }))
            }
            Expr::Column(column) => self.column(column).cloned(),
            Expr::InList { expr, list } => {
                let value = self.eval(expr)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Bool(
                    list.iter()
                        .any(|item| compare(&value, item) == Some(Ordering::Equal)),
                ))
            }
            Expr::IsNull { expr, negate } => Ok(Value::Bool(self.eval(expr)?.is_null() != *negate)),
            Expr::Raw(sql) if is_current_timestamp(sql) => Ok(Value::String(self.now.to_string())),
            Expr::Raw(sql) => Err(Error::warehouse(format!(
                "the memory warehouse cannot evaluate raw SQL `{sql}`"
            ))),
            Expr::Timestamp(value) => Ok(Value::String(value.clone())),
            Expr::Value(value) => Ok(value.clone()),
        }
    }

    fn column(&self, column: &ExprColumn) -> Result<&'a Value> {
        let row = match column.scope {
            Scope::Target => self.target,
            Scope::Source => self.source,
            Scope::Unqualified => self.target.or(self.source),
        };
        let row = row.ok_or_else(|| {
            Error::warehouse(format!(
                "The multi-part identifier '{}' could not be bound.",
                column.name
            ))
        })?;
        row.get(&column.name)
    }
}

fn is_current_timestamp(sql: &str) -> bool {
    matches!(
        sql.trim(),
        "CAST(SYSDATETIME() AS DATETIME2(6))" | "CURRENT_TIMESTAMP"
    )
}

/// SQL comparison: `None` when either side is NULL or the types differ.
pub(crate) fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs.partial_cmp(rhs),
        (Value::I64(lhs), Value::I64(rhs)) => lhs.partial_cmp(rhs),
        (Value::I64(lhs), Value::F64(rhs)) => (*lhs as f64).partial_cmp(rhs),
        (Value::F64(lhs), Value::I64(rhs)) => lhs.partial_cmp(&(*rhs as f64)),
        (Value::F64(lhs), Value::F64(rhs)) => lhs.partial_cmp(rhs),
        (Value::String(lhs), Value::String(rhs)) => lhs.partial_cmp(rhs),
        _ => None,
    }
}

/// Every key column is equal and non-null on both rows.
pub(crate) fn keys_match(
    unique_key: &[String],
    source: &Row<'_>,
    target: &Row<'_>,
) -> Result<bool> {
    for column in unique_key {
        if compare(source.get(column)?, target.get(column)?) != Some(Ordering::Equal) {
            return Ok(false);
        }
    }
    Ok(!unique_key.is_empty())
}

pub(crate) fn result_set(data: Data) -> ResultSet {
    ResultSet::new(
        data.columns.into_iter().map(|column| column.name).collect(),
        data.rows,
    )
}

fn text(name: &str) -> Column {
    Column::new(name, "varchar")
}

fn flag(value: bool) -> Value {
    Value::String(if value { "true" } else { "false" }.to_string())
}

fn optional(value: Option<u32>) -> Value {
    value.map(i64::from).into()
}

impl Warehouse {
    /// The columns and rows of a relation, evaluating views.
    pub(crate) fn read(&self, relation: &Relation) -> Result<Data> {
        let object = self
            .get(relation)
            .ok_or_else(|| Error::warehouse(format!("Invalid object name '{relation}'.")))?;

        match &object.definition {
            Some(definition) => self.eval_query(definition),
            None => Ok(Data::new(object.columns.clone(), object.rows.clone())),
        }
    }

    pub(crate) fn eval_query(&self, query: &Query) -> Result<Data> {
        match query {
            Query::Sql(sql) => match self.queries.get(normalize(sql)) {
                Some(Registered::Static(data)) => Ok(data.clone()),
                Some(Registered::Select(relation)) => self.read(relation),
                None => Err(Error::warehouse(format!(
                    "the memory warehouse has no result registered for `{}`",
                    normalize(sql)
                ))),
            },
            Query::Select(select) => self.eval_select(select),
            Query::Count(relation) => {
                let count = self.read(relation)?.rows.len() as i64;
                Ok(Data::new(
                    vec![Column::new("row_count", "bigint")],
                    vec![vec![Value::I64(count)]],
                ))
            }
            Query::Catalog(catalog) => self.eval_catalog(catalog),
            Query::TestResult(test) => {
                let failures = self.eval_select(&test.query)?.rows.len() as u64;
                Ok(Data::new(
                    vec![
                        Column::new("failures", "bigint"),
                        text("should_warn"),
                        text("should_error"),
                    ],
                    vec![vec![
                        Value::I64(failures as i64),
                        flag(test.warn_if.matches(failures)),
                        flag(test.error_if.matches(failures)),
                    ]],
                ))
            }
            Query::SnapshotBuild(build) => self.eval_snapshot_build(build),
            Query::SnapshotStaging(staging) => self.eval_snapshot_staging(staging),
        }
    }

    fn eval_select(&self, select: &Select) -> Result<Data> {
        let data = self.read(&select.from)?;

        let mut rows = vec![];
        for values in &data.rows {
            let keep = match &select.filter {
                Some(filter) => {
                    Env::target(Row::new(&data.columns, values), &self.now).holds(filter)?
                }
                None => true,
            };
            if keep {
                rows.push(values.clone());
            }
        }

        if let Some(limit) = select.limit {
            rows.truncate(limit as usize);
        }

        if select.items.is_empty() {
            return Ok(Data::new(data.columns, rows));
        }

        let mut columns = vec![];
        let mut sources = vec![];
        for item in &select.items {
            match item {
                SelectItem::Column(name) => {
                    let index = data.position(name)?;
                    columns.push(data.columns[index].clone());
                    sources.push(Some(index));
                }
                SelectItem::Cast { column, data_type } => {
                    let index = data.position(column)?;
                    columns.push(Column::parse(column.as_str(), data_type)?);
                    sources.push(Some(index));
                }
                SelectItem::Null { column, data_type } => {
                    columns.push(Column::parse(column.as_str(), data_type)?);
                    sources.push(None);
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|values| {
                sources
                    .iter()
                    .map(|source| match source {
                        Some(index) => values[*index].clone(),
                        None => Value::Null,
                    })
                    .collect()
            })
            .collect();

        Ok(Data::new(columns, rows))
    }

    fn eval_catalog(&self, catalog: &Catalog) -> Result<Data> {
        match catalog {
            Catalog::Relations {
                database,
                schema,
                identifier,
            } => {
                let matches = |relation: &Relation| {
                    relation.database() == database
                        && relation.schema() == schema
                        && identifier
                            .as_deref()
                            .is_none_or(|identifier| relation.identifier() == identifier)
                };

                let rows = self
                    .objects
                    .values()
                    .map(|object| &object.relation)
                    .chain(self.duplicates.iter())
                    .filter(|relation| matches(relation))
                    .map(|relation| {
                        vec![
                            Value::from(relation.identifier()),
                            Value::from(relation.kind().as_str()),
                        ]
                    })
                    .collect();

                Ok(Data::new(vec![text("name"), text("kind")], rows))
            }
            Catalog::Columns(relation) => {
                let columns = match self.get(relation) {
                    Some(_) => self.read(relation)?.columns,
                    None => vec![],
                };

                let rows = columns
                    .into_iter()
                    .map(|column| {
                        vec![
                            Value::from(column.name.as_str()),
                            Value::from(column.dtype.as_str()),
                            optional(column.char_size),
                            optional(column.numeric_precision),
                            optional(column.numeric_scale),
                            Value::from(if column.nullable { "YES" } else { "NO" }),
                        ]
                    })
                    .collect();

                Ok(Data::new(
                    vec![
                        text("name"),
                        text("data_type"),
                        Column::new("char_size", "int"),
                        Column::new("numeric_precision", "int"),
                        Column::new("numeric_scale", "int"),
                        text("is_nullable"),
                    ],
                    rows,
                ))
            }
            Catalog::ViewDependents(relation) => {
                let rows = self
                    .dependents(relation)
                    .into_iter()
                    .map(|view| vec![Value::from(view.schema()), Value::from(view.identifier())])
                    .collect();
                Ok(Data::new(vec![text("schema_name"), text("view_name")], rows))
            }
            Catalog::Grants(relation) => {
                let rows = self
                    .get(relation)
                    .map(|object| {
                        object
                            .grants
                            .iter()
                            .map(|(privilege, grantee)| {
                                vec![
                                    Value::from(grantee.as_str()),
                                    Value::from(privilege.to_ascii_uppercase()),
                                ]
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Data::new(vec![text("grantee"), text("privilege_type")], rows))
            }
        }
    }
}
