use super::{Comma, Delimited, Formatter, Ident, Literal, Params, ToSql};

use fabric_core::stmt::{Expr, ExprBinaryOp, ExprColumn, Scope, Value, SOURCE_ALIAS, TARGET_ALIAS};

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::And(exprs) => match &exprs[..] {
                [] => fmt!(f, f.serializer.always_true()),
                [expr] => expr.to_sql(f),
                exprs => fmt!(f, Delimited(exprs.iter().map(Parens), " AND ")),
            },
            Expr::BinaryOp(ExprBinaryOp { lhs, op, rhs }) => {
                let op = op.to_string();
                fmt!(f, lhs.as_ref() " " op " " rhs.as_ref());
            }
            Expr::Column(column) => column.to_sql(f),
            // Nothing is a member of the empty list.
            Expr::InList { list, .. } if list.is_empty() => fmt!(f, "1 = 0"),
            Expr::InList { expr, list } => {
                fmt!(f, expr.as_ref() " IN (" Comma(list.iter().map(SqlValue)) ")");
            }
            Expr::IsNull { expr, negate } => {
                let is = if *negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, expr.as_ref() is);
            }
            Expr::Raw(sql) => fmt!(f, sql),
            Expr::Timestamp(value) => {
                let ty = if f.is_fabric() { "DATETIME2(6)" } else { "TIMESTAMP" };
                fmt!(f, "CAST(" Literal(value) " AS " ty ")");
            }
            Expr::Value(value) => SqlValue(value).to_sql(f),
        }
    }
}

impl ToSql for &ExprColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.scope {
            Scope::Unqualified => {}
            Scope::Source => fmt!(f, SOURCE_ALIAS "."),
            Scope::Target => fmt!(f, TARGET_ALIAS "."),
        }
        fmt!(f, Ident(&self.name));
    }
}

/// An expression wrapped in parentheses.
pub(super) struct Parens<'a>(pub(super) &'a Expr);

impl ToSql for Parens<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" self.0 ")");
    }
}

/// A value inlined as a SQL literal.
pub(super) struct SqlValue<'a>(pub(super) &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.0 {
            Value::Null => fmt!(f, "NULL"),
            Value::Bool(value) => {
                let value = match (f.is_fabric(), value) {
                    (true, true) => "1",
                    (true, false) => "0",
                    (false, true) => "TRUE",
                    (false, false) => "FALSE",
                };
                fmt!(f, value);
            }
            Value::I64(value) => fmt!(f, value.to_string()),
            Value::F64(value) => fmt!(f, value.to_string()),
            Value::String(value) => fmt!(f, Literal(value)),
        }
    }
}

/// `alias."column"`
pub(super) struct Aliased<'a>(pub(super) &'static str, pub(super) &'a str);

impl ToSql for Aliased<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.0 "." Ident(self.1));
    }
}

/// `SOURCE."column" = TARGET."column"` for each key column, ANDed.
pub(super) struct KeyMatch<'a>(pub(super) &'a [String]);

impl ToSql for KeyMatch<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let mut s = "";
        for column in self.0 {
            fmt!(f, s Aliased(SOURCE_ALIAS, column) " = " Aliased(TARGET_ALIAS, column));
            s = " AND ";
        }
    }
}
