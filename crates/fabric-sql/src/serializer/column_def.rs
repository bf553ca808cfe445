use super::{Formatter, Ident, Params, ToSql};

use fabric_core::schema::Column;

/// A column in `CREATE TABLE` or `ALTER TABLE ... ADD`.
pub(super) struct ColumnDef<'a>(pub(super) &'a Column);

impl ToSql for ColumnDef<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let not_null = if self.0.nullable { "" } else { " NOT NULL" };
        fmt!(f, Ident(&self.0.name) " " self.0.data_type() not_null);
    }
}
