use super::{
    column_def::ColumnDef, ident::bracketed, name::SchemaQualified, Comma, Formatter, Ident,
    InDatabase, Literal, NLiteral, Params, Qualified, ToSql,
};

use fabric_core::{
    stmt::{
        AddColumns, AddConstraint, ConstraintDefKind, CreateSchema, CreateTable, CreateTableAs,
        CreateView, DropColumns, DropRelation, Grant, RenameRelation, Revoke, Truncate,
    },
    RelationKind,
};

impl ToSql for &CreateSchema {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if f.is_fabric() {
            let create = f.nested(|f| fmt!(f, "CREATE SCHEMA " Ident(&self.schema)));
            fmt!(
                f,
                "IF NOT EXISTS (SELECT 1 FROM " Ident(&self.database) ".sys.schemas WHERE name = "
                Literal(&self.schema) ") "
                InDatabase { database: &self.database, sql: create }
            );
        } else {
            fmt!(f, "CREATE SCHEMA IF NOT EXISTS " Ident(&self.database) "." Ident(&self.schema));
        }
    }
}

impl ToSql for &CreateTable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let columns = Comma(self.columns.iter().map(ColumnDef));
        fmt!(f, "CREATE TABLE " Qualified(&self.relation) " (" columns ")");
    }
}

impl ToSql for &CreateTableAs {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let query = &self.query;
        fmt!(f, "CREATE TABLE " Qualified(&self.relation) " AS " query);
    }
}

impl ToSql for &CreateView {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if f.is_fabric() {
            let create = if self.or_replace {
                "CREATE OR ALTER VIEW "
            } else {
                "CREATE VIEW "
            };
            let query = &self.query;
            let sql = f.nested(|f| fmt!(f, create SchemaQualified(&self.relation) " AS " query));
            fmt!(f, InDatabase { database: self.relation.database(), sql: sql });
        } else {
            let create = if self.or_replace {
                "CREATE OR REPLACE VIEW "
            } else {
                "CREATE VIEW "
            };
            let query = &self.query;
            fmt!(f, create Qualified(&self.relation) " AS " query);
        }
    }
}

impl ToSql for &DropRelation {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let if_exists = if self.if_exists { "IF EXISTS " } else { "" };

        match self.relation.kind() {
            RelationKind::Table => {
                fmt!(f, "DROP TABLE " if_exists Qualified(&self.relation));
            }
            RelationKind::View if f.is_fabric() => {
                let sql = f.nested(|f| {
                    fmt!(f, "DROP VIEW " if_exists SchemaQualified(&self.relation));
                });
                fmt!(f, InDatabase { database: self.relation.database(), sql: sql });
            }
            RelationKind::View => {
                let cascade = if self.cascade { " CASCADE" } else { "" };
                fmt!(f, "DROP VIEW " if_exists Qualified(&self.relation) cascade);
            }
        }
    }
}

impl ToSql for &RenameRelation {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if f.is_fabric() {
            let object = format!(
                "{}.{}",
                bracketed(self.from.schema()),
                bracketed(self.from.identifier())
            );
            fmt!(
                f,
                "EXEC " Ident(self.from.database()) ".sys.sp_rename "
                NLiteral(&object) ", " NLiteral(self.to.identifier())
            );
        } else {
            let kind = match self.from.kind() {
                RelationKind::Table => "TABLE",
                RelationKind::View => "VIEW",
            };
            fmt!(
                f,
                "ALTER " kind " " Qualified(&self.from) " RENAME TO " Ident(self.to.identifier())
            );
        }
    }
}

impl ToSql for &AddColumns {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "ALTER TABLE " Qualified(&self.relation) " ");
        if f.is_fabric() {
            fmt!(f, "ADD " Comma(self.columns.iter().map(ColumnDef)));
        } else {
            fmt!(f, Comma(self.columns.iter().map(|column| AddColumn(ColumnDef(column)))));
        }
    }
}

struct AddColumn<'a>(ColumnDef<'a>);

impl ToSql for AddColumn<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "ADD COLUMN " self.0);
    }
}

impl ToSql for &DropColumns {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "ALTER TABLE " Qualified(&self.relation) " ");
        if f.is_fabric() {
            fmt!(f, "DROP COLUMN " Comma(self.columns.iter().map(Ident)));
        } else {
            let mut s = "";
            for column in &self.columns {
                fmt!(f, s "DROP COLUMN " Ident(column));
                s = ", ";
            }
        }
    }
}

impl ToSql for &AddConstraint {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let constraint = &self.constraint;
        // Fabric stores keys as metadata on nonclustered definitions only.
        let nonclustered = if f.is_fabric() { " NONCLUSTERED" } else { "" };

        fmt!(
            f,
            "ALTER TABLE " Qualified(&self.relation) " ADD CONSTRAINT " Ident(&constraint.name) " "
        );

        match &constraint.kind {
            ConstraintDefKind::PrimaryKey(columns) => {
                fmt!(f, "PRIMARY KEY" nonclustered " (" Comma(columns.iter().map(Ident)) ")");
            }
            ConstraintDefKind::Unique(columns) => {
                fmt!(f, "UNIQUE" nonclustered " (" Comma(columns.iter().map(Ident)) ")");
            }
            ConstraintDefKind::ForeignKey {
                columns,
                references,
                to_columns,
            } => {
                fmt!(
                    f,
                    "FOREIGN KEY (" Comma(columns.iter().map(Ident)) ") REFERENCES " references
                );
                if !to_columns.is_empty() {
                    fmt!(f, " (" Comma(to_columns.iter().map(Ident)) ")");
                }
            }
            ConstraintDefKind::Check(expression) => {
                fmt!(f, "CHECK (" expression ")");
            }
        }

        if !constraint.enforced {
            fmt!(f, " NOT ENFORCED");
        }
    }
}

impl ToSql for &Truncate {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "TRUNCATE TABLE " Qualified(&self.relation));
    }
}

impl ToSql for &Grant {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let privilege = self.privilege.to_ascii_uppercase();
        let grantees = &self.grantees;

        if f.is_fabric() {
            let sql = f.nested(|f| {
                fmt!(
                    f,
                    "GRANT " privilege " ON " SchemaQualified(&self.relation) " TO "
                    Comma(grantees.iter().map(Ident))
                )
            });
            fmt!(f, InDatabase { database: self.relation.database(), sql: sql });
        } else {
            fmt!(
                f,
                "GRANT " privilege " ON " Qualified(&self.relation) " TO "
                Comma(grantees.iter().map(Ident))
            );
        }
    }
}

impl ToSql for &Revoke {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let privilege = self.privilege.to_ascii_uppercase();
        let grantees = &self.grantees;

        if f.is_fabric() {
            let sql = f.nested(|f| {
                fmt!(
                    f,
                    "REVOKE " privilege " ON " SchemaQualified(&self.relation) " FROM "
                    Comma(grantees.iter().map(Ident))
                )
            });
            fmt!(f, InDatabase { database: self.relation.database(), sql: sql });
        } else {
            fmt!(
                f,
                "REVOKE " privilege " ON " Qualified(&self.relation) " FROM "
                Comma(grantees.iter().map(Ident))
            );
        }
    }
}
