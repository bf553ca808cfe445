use super::{Formatter, Params, ToSql};

/// A double-quoted identifier.
pub(super) struct Ident<S>(pub(super) S);

/// A single-quoted string literal.
pub(super) struct Literal<S>(pub(super) S);

/// A Unicode (`N'...'`) string literal.
pub(super) struct NLiteral<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push('"');
        f.dst.push_str(&self.0.as_ref().replace('"', "\"\""));
        f.dst.push('"');
    }
}

impl<S: AsRef<str>> ToSql for Literal<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push('\'');
        f.dst.push_str(&self.0.as_ref().replace('\'', "''"));
        f.dst.push('\'');
    }
}

impl<S: AsRef<str>> ToSql for NLiteral<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push('N');
        Literal(self.0).to_sql(f);
    }
}

/// `[name]`, the form `sp_rename` expects for object names.
pub(super) fn bracketed(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

pub(super) fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
