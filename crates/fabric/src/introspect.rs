use crate::Adapter;

use fabric_core::{
    driver::ResultSet,
    stmt::{Catalog, Value},
    Column, Error, Relation, RelationKind, Result,
};

impl Adapter {
    /// Relations in `database.schema`, as the catalog reports them.
    pub async fn list_relations(&mut self, database: &str, schema: &str) -> Result<Vec<Relation>> {
        let rows = self.fetch(Catalog::relations(database, schema)).await?;
        relations_from(&rows, database, schema)
    }

    /// The relation currently stored under `relation`'s name, with its actual
    /// kind, or `None` when nothing is.
    ///
    /// More than one match means the catalog disagrees with itself, which
    /// can happen while it lags behind DDL; that is reported rather than
    /// resolved by picking one.
    pub async fn get_relation(&mut self, relation: &Relation) -> Result<Option<Relation>> {
        let rows = self.fetch(Catalog::relation(relation)).await?;
        let matches = relations_from(&rows, relation.database(), relation.schema())?;

        match &matches[..] {
            [] => Ok(None),
            [existing] => Ok(Some(existing.clone())),
            _ => Err(Error::ambiguous_catalog(relation, matches.len())),
        }
    }

    /// Columns of a table or view, in ordinal order.
    pub async fn columns_of(&mut self, relation: &Relation) -> Result<Vec<Column>> {
        let rows = self.fetch(Catalog::Columns(relation.clone())).await?;

        (0..rows.len())
            .map(|row| {
                let mut column = Column::new(
                    text(&rows, row, "name")?,
                    text(&rows, row, "data_type")?.to_ascii_lowercase(),
                );
                column.char_size = size(rows.get(row, "char_size")?);
                column.numeric_precision = size(rows.get(row, "numeric_precision")?);
                column.numeric_scale = size(rows.get(row, "numeric_scale")?);
                column.nullable = !text(&rows, row, "is_nullable")?.eq_ignore_ascii_case("NO");
                Ok(column)
            })
            .collect()
    }

    /// Views that reference `relation` directly.
    pub async fn view_dependents(&mut self, relation: &Relation) -> Result<Vec<Relation>> {
        let rows = self
            .fetch(Catalog::ViewDependents(relation.clone()))
            .await?;

        (0..rows.len())
            .map(|row| {
                Relation::view(
                    relation.database(),
                    text(&rows, row, "schema_name")?,
                    text(&rows, row, "view_name")?,
                )
            })
            .collect()
    }

    /// `(privilege, grantee)` pairs granted on `relation`, privileges in
    /// lower case.
    pub async fn grants_of(&mut self, relation: &Relation) -> Result<Vec<(String, String)>> {
        let rows = self.fetch(Catalog::Grants(relation.clone())).await?;

        (0..rows.len())
            .map(|row| {
                Ok((
                    text(&rows, row, "privilege_type")?.to_ascii_lowercase(),
                    text(&rows, row, "grantee")?,
                ))
            })
            .collect()
    }

    /// Scratch relations left in `database.schema` by runs that never
    /// cleaned up, recognized by their derived names.
    pub async fn orphaned_relations(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<Relation>> {
        Ok(self
            .list_relations(database, schema)
            .await?
            .into_iter()
            .filter(Relation::is_derived)
            .collect())
    }
}

fn relations_from(rows: &ResultSet, database: &str, schema: &str) -> Result<Vec<Relation>> {
    (0..rows.len())
        .map(|row| {
            let kind = RelationKind::from_catalog(&text(rows, row, "kind")?)?;
            Relation::new(database, schema, text(rows, row, "name")?, kind)
        })
        .collect()
}

fn text(rows: &ResultSet, row: usize, column: &str) -> Result<String> {
    match rows.get(row, column)? {
        Value::String(value) => Ok(value.clone()),
        other => Err(Error::invalid_result(format!(
            "expected text in `{column}`, got {other:?}"
        ))),
    }
}

/// Catalog sizes; `-1` stands for `max`.
fn size(value: &Value) -> Option<u32> {
    value.to_i64().and_then(|size| u32::try_from(size).ok())
}
