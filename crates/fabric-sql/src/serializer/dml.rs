use super::expr::{Aliased, KeyMatch, Parens};
use super::{Comma, Formatter, Ident, Params, Qualified, ToSql};

use fabric_core::stmt::{
    Delete, DeleteFilter, Expr, Insert, InsertSource, Merge, UpdateFrom, Value, SOURCE_ALIAS,
    TARGET_ALIAS,
};

impl ToSql for &Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let columns = Comma(self.columns.iter().map(Ident));
        fmt!(f, "INSERT INTO " Qualified(&self.target) " (" columns ") ");

        match &self.source {
            InsertSource::Select(select) => select.to_sql(f),
            InsertSource::Values(rows) => {
                let rows = Comma(rows.iter().map(|row| Row(row)));
                fmt!(f, "VALUES " rows);
            }
        }
    }
}

/// A parenthesized row constructor with every value bound as a parameter.
struct Row<'a>(&'a [Value]);

impl ToSql for Row<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0.iter().map(Bind)) ")");
    }
}

struct Bind<'a>(&'a Value);

impl ToSql for Bind<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = f.params.push(self.0);
        placeholder.to_sql(f);
    }
}

impl ToSql for &Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let target = Qualified(&self.target);

        let predicates = match &self.filter {
            DeleteFilter::All => {
                fmt!(f, "DELETE FROM " target);
                return;
            }
            DeleteFilter::MatchingKeys { predicates, .. } => predicates,
            DeleteFilter::Predicates(predicates) => predicates,
        };

        // T-SQL names the alias being deleted from before the FROM clause.
        if f.is_fabric() {
            fmt!(f, "DELETE " TARGET_ALIAS " FROM " target " AS " TARGET_ALIAS " WHERE ");
        } else {
            fmt!(f, "DELETE FROM " target " AS " TARGET_ALIAS " WHERE ");
        }

        let mut s = "";
        if let DeleteFilter::MatchingKeys {
            source, unique_key, ..
        } = &self.filter
        {
            let source = Qualified(source);
            match &unique_key[..] {
                [column] => {
                    fmt!(
                        f,
                        Aliased(TARGET_ALIAS, column)
                        " IN (SELECT " Ident(column) " FROM " source ")"
                    );
                }
                columns => {
                    let key = KeyMatch(columns);
                    fmt!(f, "EXISTS (SELECT 1 FROM " source " AS " SOURCE_ALIAS " WHERE " key ")");
                }
            }
            s = " AND ";
        }

        if predicates.is_empty() && s.is_empty() {
            fmt!(f, f.serializer.always_true());
        }

        for predicate in predicates {
            fmt!(f, s Parens(predicate));
            s = " AND ";
        }
    }
}

impl ToSql for &Merge {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let target = Qualified(&self.target);
        let source = Qualified(&self.source);
        fmt!(
            f,
            "MERGE INTO " target " AS " TARGET_ALIAS
            " USING " source " AS " SOURCE_ALIAS " ON ("
        );

        if self.unique_key.is_empty() {
            // No key, no match: every source row is inserted.
            fmt!(f, "1 = 0");
        } else {
            for predicate in &self.predicates {
                fmt!(f, Parens(predicate) " AND ");
            }
            fmt!(f, KeyMatch(&self.unique_key));
        }
        fmt!(f, ")");

        if !self.unique_key.is_empty() && !self.update_columns.is_empty() {
            let assignments = Comma(self.update_columns.iter().map(|column| Assign(column)));
            fmt!(f, " WHEN MATCHED THEN UPDATE SET " assignments);
        }

        let columns = Comma(self.insert_columns.iter().map(Ident));
        let values = Comma(
            self.insert_columns
                .iter()
                .map(|column| Aliased(SOURCE_ALIAS, column)),
        );
        fmt!(f, " WHEN NOT MATCHED THEN INSERT (" columns ") VALUES (" values ")");
    }
}

/// `"column" = SOURCE."column"`
struct Assign<'a>(&'a str);

impl ToSql for Assign<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " Aliased(SOURCE_ALIAS, self.0));
    }
}

impl ToSql for &UpdateFrom {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let target = Qualified(&self.target);
        let source = Qualified(&self.source);
        let assignments = Comma(self.assignments.iter().map(|column| Assign(column)));
        let join = KeyMatch(&self.join);

        if f.is_fabric() {
            fmt!(
                f,
                "UPDATE " TARGET_ALIAS " SET " assignments
                " FROM " target " AS " TARGET_ALIAS
                " INNER JOIN " source " AS " SOURCE_ALIAS " ON " join
            );
            if !self.filter.is_empty() {
                fmt!(f, " WHERE ");
                filters(f, &self.filter);
            }
        } else {
            fmt!(
                f,
                "UPDATE " target " AS " TARGET_ALIAS " SET " assignments
                " FROM " source " AS " SOURCE_ALIAS " WHERE " join
            );
            if !self.filter.is_empty() {
                fmt!(f, " AND ");
                filters(f, &self.filter);
            }
        }
    }
}

fn filters<P: Params>(f: &mut Formatter<'_, P>, exprs: &[Expr]) {
    let mut s = "";
    for expr in exprs {
        fmt!(f, s Parens(expr));
        s = " AND ";
    }
}
