use super::{Formatter, Ident, Literal, Params, ToSql};

use fabric_core::{stmt::Catalog, Relation};

impl ToSql for &Catalog {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Catalog::Relations {
                database,
                schema,
                identifier,
            } => {
                fmt!(
                    f,
                    "SELECT TABLE_NAME AS " Ident("name") ", "
                    "CASE TABLE_TYPE WHEN 'VIEW' THEN 'view' ELSE 'table' END AS " Ident("kind")
                    " FROM " Ident(database) ".INFORMATION_SCHEMA.TABLES"
                    " WHERE TABLE_SCHEMA = " Literal(schema)
                );
                if let Some(identifier) = identifier {
                    fmt!(f, " AND TABLE_NAME = " Literal(identifier));
                }
            }
            Catalog::Columns(relation) => {
                fmt!(
                    f,
                    "SELECT COLUMN_NAME AS " Ident("name") ", "
                    "DATA_TYPE AS " Ident("data_type") ", "
                    "CHARACTER_MAXIMUM_LENGTH AS " Ident("char_size") ", "
                    "NUMERIC_PRECISION AS " Ident("numeric_precision") ", "
                    "NUMERIC_SCALE AS " Ident("numeric_scale") ", "
                    "IS_NULLABLE AS " Ident("is_nullable")
                    " FROM " Ident(relation.database()) ".INFORMATION_SCHEMA.COLUMNS"
                    " WHERE " ObjectIs(relation)
                    " ORDER BY ORDINAL_POSITION"
                );
            }
            Catalog::ViewDependents(relation) if f.is_fabric() => {
                fmt!(
                    f,
                    "SELECT DISTINCT vs.name AS " Ident("schema_name")
                    ", v.name AS " Ident("view_name")
                    " FROM " Ident(relation.database()) ".sys.sql_expression_dependencies AS d"
                    " INNER JOIN " Ident(relation.database()) ".sys.views AS v"
                    " ON v.object_id = d.referencing_id"
                    " INNER JOIN " Ident(relation.database()) ".sys.schemas AS vs"
                    " ON vs.schema_id = v.schema_id"
                    " INNER JOIN " Ident(relation.database()) ".sys.objects AS o"
                    " ON o.object_id = d.referenced_id"
                    " INNER JOIN " Ident(relation.database()) ".sys.schemas AS os"
                    " ON os.schema_id = o.schema_id"
                    " WHERE os.name = " Literal(relation.schema())
                    " AND o.name = " Literal(relation.identifier())
                );
            }
            Catalog::ViewDependents(relation) => {
                fmt!(
                    f,
                    "SELECT DISTINCT VIEW_SCHEMA AS " Ident("schema_name")
                    ", VIEW_NAME AS " Ident("view_name")
                    " FROM " Ident(relation.database()) ".INFORMATION_SCHEMA.VIEW_TABLE_USAGE"
                    " WHERE " ObjectIs(relation)
                );
            }
            Catalog::Grants(relation) => {
                fmt!(
                    f,
                    "SELECT GRANTEE AS " Ident("grantee")
                    ", PRIVILEGE_TYPE AS " Ident("privilege_type")
                    " FROM " Ident(relation.database()) ".INFORMATION_SCHEMA.TABLE_PRIVILEGES"
                    " WHERE " ObjectIs(relation)
                );
            }
        }
    }
}

/// `TABLE_SCHEMA = 'schema' AND TABLE_NAME = 'identifier'`
struct ObjectIs<'a>(&'a Relation);

impl ToSql for ObjectIs<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(
            f,
            "TABLE_SCHEMA = " Literal(self.0.schema())
            " AND TABLE_NAME = " Literal(self.0.identifier())
        );
    }
}
