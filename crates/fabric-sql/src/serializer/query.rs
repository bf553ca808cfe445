use super::{Comma, Formatter, Ident, Params, Qualified, ToSql};

use fabric_core::stmt::{Query, Select, SelectItem, TestResult};

impl ToSql for &Query {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            // The statement is embedded in a larger one, so a trailing
            // terminator would end it early.
            Query::Sql(sql) => fmt!(f, sql.trim_end().trim_end_matches(';').trim_end()),
            Query::Select(select) => select.to_sql(f),
            Query::Count(relation) => {
                fmt!(f, "SELECT COUNT(*) AS " Ident("row_count") " FROM " Qualified(relation));
            }
            Query::Catalog(catalog) => catalog.to_sql(f),
            Query::TestResult(test) => test.to_sql(f),
            Query::SnapshotBuild(build) => build.to_sql(f),
            Query::SnapshotStaging(staging) => staging.to_sql(f),
        }
    }
}

impl ToSql for &Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "SELECT ");

        if f.is_fabric() {
            if let Some(limit) = self.limit {
                fmt!(f, "TOP " limit " ");
            }
        }

        if self.items.is_empty() {
            fmt!(f, "*");
        } else {
            fmt!(f, Comma(&self.items));
        }

        fmt!(f, " FROM " Qualified(&self.from));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if !f.is_fabric() {
            if let Some(limit) = self.limit {
                fmt!(f, " LIMIT " limit);
            }
        }
    }
}

impl ToSql for &SelectItem {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            SelectItem::Column(column) => fmt!(f, Ident(column)),
            SelectItem::Cast { column, data_type } => {
                fmt!(f, "CAST(" Ident(column) " AS " data_type ") AS " Ident(column));
            }
            SelectItem::Null { column, data_type } => {
                fmt!(f, "CAST(NULL AS " data_type ") AS " Ident(column));
            }
        }
    }
}

impl ToSql for &TestResult {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let warn_if = self.warn_if.to_string();
        let error_if = self.error_if.to_string();
        let query = &self.query;

        fmt!(
            f,
            "SELECT COUNT(*) AS " Ident("failures") ", "
            "CASE WHEN COUNT(*) " warn_if " THEN 'true' ELSE 'false' END AS "
            Ident("should_warn") ", "
            "CASE WHEN COUNT(*) " error_if " THEN 'true' ELSE 'false' END AS " Ident("should_error")
            " FROM (" query ") AS " Ident("dbt_internal_test")
        );
    }
}
