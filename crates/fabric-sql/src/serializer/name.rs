use super::{Formatter, Ident, Params, ToSql};

use fabric_core::Relation;

/// `"database"."schema"."identifier"`
pub(super) struct Qualified<'a>(pub(super) &'a Relation);

/// `"schema"."identifier"`, for statements executed inside the relation's database.
pub(super) struct SchemaQualified<'a>(pub(super) &'a Relation);

impl ToSql for Qualified<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0.database()) "." SchemaQualified(self.0));
    }
}

impl ToSql for SchemaQualified<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0.schema()) "." Ident(self.0.identifier()));
    }
}

impl ToSql for &Relation {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        Qualified(self).to_sql(f);
    }
}
