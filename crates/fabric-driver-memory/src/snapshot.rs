use crate::{
    eval::compare,
    warehouse::{position, Data, Warehouse},
};

use fabric_core::{
    schema::Column,
    stmt::{SnapshotBuild, SnapshotRule, SnapshotStaging, Value},
    Result,
};
use std::cmp::Ordering;

/// Resolves the key and version columns of a source relation.
struct Source<'a> {
    data: &'a Data,
    unique_key: Vec<usize>,
    updated_at: Option<usize>,
    now: &'a str,
}

impl<'a> Source<'a> {
    fn new(
        data: &'a Data,
        unique_key: &[String],
        rule: &SnapshotRule,
        now: &'a str,
    ) -> Result<Source<'a>> {
        Ok(Source {
            data,
            unique_key: unique_key
                .iter()
                .map(|column| position(&data.columns, column))
                .collect::<Result<_>>()?,
            updated_at: rule
                .updated_at()
                .map(|column| position(&data.columns, column))
                .transpose()?,
            now,
        })
    }

    /// The single key column as is, composite keys joined into one string.
    fn key(&self, row: &[Value]) -> Value {
        match &self.unique_key[..] {
            [index] => row[*index].clone(),
            indices => Value::String(
                indices
                    .iter()
                    .map(|index| row[*index].to_string())
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
        }
    }

    fn updated(&self, row: &[Value]) -> Value {
        match self.updated_at {
            Some(index) => row[index].clone(),
            None => Value::String(self.now.to_string()),
        }
    }

    fn scd_id(&self, row: &[Value]) -> Value {
        Value::String(format!("{}|{}", self.key(row), self.updated(row)))
    }

    fn key_column(&self) -> Column {
        match &self.unique_key[..] {
            [index] => Column {
                name: SnapshotBuild::UNIQUE_KEY.to_string(),
                ..self.data.columns[*index].clone()
            },
            _ => Column::new(SnapshotBuild::UNIQUE_KEY, "varchar").with_char_size(32),
        }
    }

    fn timestamp_column(&self, name: &str) -> Column {
        match self.updated_at {
            Some(index) => Column {
                name: name.to_string(),
                ..self.data.columns[index].clone()
            },
            None => Column::new(name, "datetime2"),
        }
    }
}

fn scd_column() -> Column {
    Column::new(SnapshotBuild::SCD_ID, "varchar").with_char_size(32)
}

fn same(lhs: &Value, rhs: &Value) -> bool {
    compare(lhs, rhs) == Some(Ordering::Equal)
}

/// Null-aware inequality: a value changing to or from NULL counts.
fn differs(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => false,
        (false, false) => !same(lhs, rhs),
        _ => true,
    }
}

impl Warehouse {
    pub(crate) fn eval_snapshot_build(&self, build: &SnapshotBuild) -> Result<Data> {
        let data = self.read(&build.source)?;
        let source = Source::new(&data, &build.unique_key, &build.rule, &self.now)?;

        let mut columns = data.columns.clone();
        columns.push(scd_column());
        columns.push(source.timestamp_column(SnapshotBuild::UPDATED_AT));
        columns.push(source.timestamp_column(SnapshotBuild::VALID_FROM));
        columns.push(source.timestamp_column(SnapshotBuild::VALID_TO));

        let rows = data
            .rows
            .iter()
            .map(|row| {
                let mut values = row.clone();
                values.push(source.scd_id(row));
                values.push(source.updated(row));
                values.push(source.updated(row));
                values.push(Value::Null);
                values
            })
            .collect();

        Ok(Data::new(columns, rows))
    }

    pub(crate) fn eval_snapshot_staging(&self, staging: &SnapshotStaging) -> Result<Data> {
        let data = self.read(&staging.source)?;
        let source = Source::new(&data, &staging.unique_key, &staging.rule, &self.now)?;

        let snapshot = self.read(&staging.target)?;
        let target_key = staging
            .unique_key
            .iter()
            .map(|column| position(&snapshot.columns, column))
            .collect::<Result<Vec<_>>>()?;
        let valid_from = snapshot.position(SnapshotBuild::VALID_FROM)?;
        let valid_to = snapshot.position(SnapshotBuild::VALID_TO)?;
        let scd_id = snapshot.position(SnapshotBuild::SCD_ID)?;

        let target = Source {
            data: &snapshot,
            unique_key: target_key,
            updated_at: None,
            now: &self.now,
        };
        let current = snapshot
            .rows
            .iter()
            .filter(|row| row[valid_to].is_null())
            .collect::<Vec<_>>();

        let changed = |source_row: &[Value], current_row: &[Value]| -> Result<bool> {
            match &staging.rule {
                SnapshotRule::Timestamp { .. } => Ok(compare(
                    &current_row[valid_from],
                    &source.updated(source_row),
                ) == Some(Ordering::Less)),
                SnapshotRule::Check { always_changed: true, .. } => Ok(true),
                SnapshotRule::Check { columns, .. } => {
                    for column in columns {
                        let new = &source_row[position(&data.columns, column)?];
                        let old = &current_row[snapshot.position(column)?];
                        if differs(old, new) {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        };

        let mut columns = vec![Column::new(SnapshotBuild::CHANGE_TYPE, "varchar")];
        columns.extend(data.columns.iter().cloned());
        columns.push(source.key_column());
        columns.push(source.timestamp_column(SnapshotBuild::UPDATED_AT));
        columns.push(source.timestamp_column(SnapshotBuild::VALID_FROM));
        columns.push(source.timestamp_column(SnapshotBuild::VALID_TO));
        columns.push(scd_column());

        let versioned = |change: &str, row: &[Value], valid_to: Value, scd_id: Value| {
            let mut values = vec![Value::from(change)];
            values.extend(row.iter().cloned());
            values.push(source.key(row));
            values.push(source.updated(row));
            values.push(source.updated(row));
            values.push(valid_to);
            values.push(scd_id);
            values
        };

        let mut inserts = vec![];
        let mut updates = vec![];
        for row in &data.rows {
            let row = row.as_slice();
            let key = source.key(row);
            let matched = current
                .iter()
                .find(|current_row| same(&target.key(current_row), &key));

            match matched {
                None => inserts.push(versioned("insert", row, Value::Null, source.scd_id(row))),
                Some(current_row) => {
                    if changed(row, current_row.as_slice())? {
                        inserts.push(versioned("insert", row, Value::Null, source.scd_id(row)));
                        updates.push(versioned(
                            "update",
                            row,
                            source.updated(row),
                            current_row[scd_id].clone(),
                        ));
                    }
                }
            }
        }

        let mut deletes = vec![];
        if staging.invalidate_hard_deletes {
            for current_row in &current {
                let key = target.key(current_row);
                let present = data.rows.iter().any(|row| same(&source.key(row), &key));
                if present {
                    continue;
                }

                let now = Value::String(self.now.clone());
                let mut values = vec![Value::from("delete")];
                values.extend(data.columns.iter().map(|_| Value::Null));
                values.push(Value::Null);
                values.push(now.clone());
                values.push(now.clone());
                values.push(now);
                values.push(current_row[scd_id].clone());
                deletes.push(values);
            }
        }

        let rows = inserts.into_iter().chain(updates).chain(deletes).collect();
        Ok(Data::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_aware_difference() {
        assert!(!differs(&Value::Null, &Value::Null));
        assert!(differs(&Value::Null, &Value::from("a")));
        assert!(differs(&Value::from("a"), &Value::Null));
        assert!(differs(&Value::from("a"), &Value::from("b")));
        assert!(!differs(&Value::I64(1), &Value::I64(1)));
    }
}
