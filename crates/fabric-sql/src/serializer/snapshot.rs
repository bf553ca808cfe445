use super::{ident::quote, Formatter, Ident, Params, Qualified, ToSql};

use fabric_core::stmt::{SnapshotBuild, SnapshotRule, SnapshotStaging};

const UNIQUE_KEY: &str = SnapshotBuild::UNIQUE_KEY;

impl ToSql for &SnapshotBuild {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let updated_at = updated_at_expr(f, &self.rule);
        let scd_id = scd_id_expr(f, &self.unique_key, &updated_at);
        let updated_at = updated_at.as_str();
        let valid_to = f.serializer.null_timestamp();

        fmt!(
            f,
            "SELECT *, " scd_id " AS " Ident(SnapshotBuild::SCD_ID)
            ", " updated_at " AS " Ident(SnapshotBuild::UPDATED_AT)
            ", " updated_at " AS " Ident(SnapshotBuild::VALID_FROM)
            ", " valid_to " AS " Ident(SnapshotBuild::VALID_TO)
            " FROM " Qualified(&self.source)
        );
    }
}

impl ToSql for &SnapshotStaging {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let updated_at = updated_at_expr(f, &self.rule);
        let scd_id = scd_id_expr(f, &self.unique_key, &updated_at);
        let unique_key = unique_key_expr(f, &self.unique_key);
        let row_changed = row_changed_expr(f, &self.rule);

        let updated_at = updated_at.as_str();
        let unique_key = unique_key.as_str();
        let row_changed = row_changed.as_str();
        let null_timestamp = f.serializer.null_timestamp();
        let now = f.serializer.current_timestamp();

        fmt!(
            f,
            "WITH snapshot_query AS (SELECT * FROM " Qualified(&self.source) "),\n"

            "snapshotted_data AS (SELECT *, " unique_key " AS " Ident(UNIQUE_KEY)
            " FROM " Qualified(&self.target)
            " WHERE " Ident(SnapshotBuild::VALID_TO) " IS NULL),\n"

            "insertions_source_data AS (SELECT *, " unique_key " AS " Ident(UNIQUE_KEY)
            ", " updated_at " AS " Ident(SnapshotBuild::UPDATED_AT)
            ", " updated_at " AS " Ident(SnapshotBuild::VALID_FROM)
            ", " null_timestamp " AS " Ident(SnapshotBuild::VALID_TO)
            ", " scd_id " AS " Ident(SnapshotBuild::SCD_ID)
            " FROM snapshot_query),\n"

            "updates_source_data AS (SELECT *, " unique_key " AS " Ident(UNIQUE_KEY)
            ", " updated_at " AS " Ident(SnapshotBuild::UPDATED_AT)
            ", " updated_at " AS " Ident(SnapshotBuild::VALID_FROM)
            ", " updated_at " AS " Ident(SnapshotBuild::VALID_TO)
            " FROM snapshot_query),\n"
        );

        if self.invalidate_hard_deletes {
            fmt!(
                f,
                "deletes_source_data AS (SELECT *, " unique_key " AS " Ident(UNIQUE_KEY)
                " FROM snapshot_query),\n"
            );
        }

        fmt!(
            f,
            "insertions AS (SELECT 'insert' AS " Ident(SnapshotBuild::CHANGE_TYPE) ", source_data.*"
            " FROM insertions_source_data AS source_data"
            " LEFT OUTER JOIN snapshotted_data ON " KeyJoin
            " WHERE snapshotted_data." Ident(UNIQUE_KEY) " IS NULL"
            " OR (snapshotted_data." Ident(UNIQUE_KEY) " IS NOT NULL AND (" row_changed "))),\n"

            "updates AS (SELECT 'update' AS " Ident(SnapshotBuild::CHANGE_TYPE) ", source_data.*"
            ", snapshotted_data." Ident(SnapshotBuild::SCD_ID)
            " FROM updates_source_data AS source_data"
            " INNER JOIN snapshotted_data ON " KeyJoin
            " WHERE (" row_changed "))"
        );

        if self.invalidate_hard_deletes {
            // Keys missing from the source close their current version now.
            fmt!(
                f,
                ",\ndeletes AS (SELECT 'delete' AS " Ident(SnapshotBuild::CHANGE_TYPE)
                ", source_data.*"
                ", " now " AS " Ident(SnapshotBuild::UPDATED_AT)
                ", " now " AS " Ident(SnapshotBuild::VALID_FROM)
                ", " now " AS " Ident(SnapshotBuild::VALID_TO)
                ", snapshotted_data." Ident(SnapshotBuild::SCD_ID)
                " FROM snapshotted_data"
                " LEFT OUTER JOIN deletes_source_data AS source_data ON " KeyJoin
                " WHERE source_data." Ident(UNIQUE_KEY) " IS NULL)"
            );
        }

        fmt!(f, "\nSELECT * FROM insertions UNION ALL SELECT * FROM updates");

        if self.invalidate_hard_deletes {
            fmt!(f, " UNION ALL SELECT * FROM deletes");
        }
    }
}

/// `snapshotted_data."dbt_unique_key" = source_data."dbt_unique_key"`
struct KeyJoin;

impl ToSql for KeyJoin {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "snapshotted_data." Ident(UNIQUE_KEY) " = source_data." Ident(UNIQUE_KEY));
    }
}

/// The timestamp a new version is stamped with.
fn updated_at_expr<P: Params>(f: &Formatter<'_, P>, rule: &SnapshotRule) -> String {
    match rule.updated_at() {
        Some(column) => quote(column),
        None => f.serializer.current_timestamp().to_string(),
    }
}

/// The key column itself, or a hash of a composite key.
fn unique_key_expr<P: Params>(f: &Formatter<'_, P>, unique_key: &[String]) -> String {
    match unique_key {
        [column] => quote(column),
        columns => f.serializer.hash(&quoted(columns)),
    }
}

fn scd_id_expr<P: Params>(f: &Formatter<'_, P>, unique_key: &[String], updated_at: &str) -> String {
    let mut parts = quoted(unique_key);
    parts.push(updated_at.to_string());
    f.serializer.hash(&parts)
}

fn row_changed_expr<P: Params>(f: &Formatter<'_, P>, rule: &SnapshotRule) -> String {
    match rule {
        SnapshotRule::Timestamp { .. } => format!(
            "snapshotted_data.{} < source_data.{}",
            quote(SnapshotBuild::VALID_FROM),
            quote(SnapshotBuild::UPDATED_AT),
        ),
        SnapshotRule::Check {
            always_changed: true,
            ..
        } => f.serializer.always_true().to_string(),
        SnapshotRule::Check { columns, .. } if columns.is_empty() => "1 = 0".to_string(),
        SnapshotRule::Check { columns, .. } => columns
            .iter()
            .map(|column| {
                let before = format!("snapshotted_data.{}", quote(column));
                let after = format!("source_data.{}", quote(column));
                format!(
                    "{before} <> {after} \
                     OR ({before} IS NULL AND {after} IS NOT NULL) \
                     OR ({before} IS NOT NULL AND {after} IS NULL)"
                )
            })
            .collect::<Vec<_>>()
            .join(" OR "),
    }
}

fn quoted(columns: &[String]) -> Vec<String> {
    columns.iter().map(|column| quote(column)).collect()
}
