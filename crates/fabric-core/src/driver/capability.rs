use crate::config::Dialect;

/// Facts about what the warehouse dialect can do. Materializations consult
/// these instead of branching on the dialect.
#[derive(Debug)]
pub struct Capability {
    /// `ALTER TABLE ... ADD <column>` is available.
    pub alter_add_column: bool,

    /// `ALTER TABLE ... DROP COLUMN` is available.
    pub alter_drop_column: bool,

    /// `TRUNCATE TABLE` is available. Without it, tables are cleared with `DELETE`.
    pub truncate: bool,

    /// `CREATE OR REPLACE VIEW` swaps a view in place.
    pub atomic_replace: bool,

    /// A rename may move an object into another schema.
    pub rename_across_schema: bool,

    /// Queries with CTEs cannot be nested in `CREATE TABLE AS`, `INSERT ...
    /// SELECT` or subqueries; they are staged behind a view first.
    pub view_indirection_for_cte: bool,

    /// `MERGE` is available.
    pub merge: bool,

    /// `BEGIN`/`COMMIT` can group several DML statements.
    pub multi_statement_transactions: bool,

    /// `DROP VIEW ... CASCADE` removes dependent views.
    pub cascade_view_drop: bool,

    /// Most bound parameters a single statement may carry.
    pub max_insert_parameters: usize,

    /// Most row constructors a single `INSERT ... VALUES` may carry.
    pub max_insert_rows: usize,

    pub max_identifier_length: usize,

    pub constraints: ConstraintSupports,
}

/// How the warehouse treats a declared constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSupport {
    Enforced,

    /// Accepted as metadata only; rows are not checked.
    NotEnforced,

    NotSupported,
}

#[derive(Debug)]
pub struct ConstraintSupports {
    pub not_null: ConstraintSupport,
    pub primary_key: ConstraintSupport,
    pub unique: ConstraintSupport,
    pub foreign_key: ConstraintSupport,
    pub check: ConstraintSupport,
}

impl Capability {
    /// Microsoft Fabric warehouse capabilities.
    pub const FABRIC: Self = Self {
        alter_add_column: false,
        alter_drop_column: false,
        truncate: false,
        atomic_replace: false,
        rename_across_schema: false,
        view_indirection_for_cte: true,
        merge: true,
        multi_statement_transactions: false,
        cascade_view_drop: false,
        // SQL Server allows 2100 parameters per request; one is reserved.
        max_insert_parameters: 2099,
        max_insert_rows: 1000,
        max_identifier_length: 128,
        constraints: ConstraintSupports::FABRIC,
    };

    /// A generic ANSI warehouse with the common DDL conveniences.
    pub const ANSI: Self = Self {
        alter_add_column: true,
        alter_drop_column: true,
        truncate: true,
        atomic_replace: true,
        rename_across_schema: false,
        view_indirection_for_cte: false,
        merge: true,
        multi_statement_transactions: true,
        cascade_view_drop: true,
        max_insert_parameters: 65_535,
        max_insert_rows: 10_000,
        constraints: ConstraintSupports::ANSI,
        ..Self::FABRIC
    };

    pub fn for_dialect(dialect: Dialect) -> &'static Capability {
        match dialect {
            Dialect::Fabric => &Self::FABRIC,
            Dialect::Ansi => &Self::ANSI,
        }
    }

    /// Rows per `INSERT ... VALUES` so that neither the row nor the parameter
    /// ceiling is exceeded.
    pub fn insert_batch_size(&self, columns: usize) -> usize {
        (self.max_insert_parameters / columns.max(1)).clamp(1, self.max_insert_rows)
    }
}

impl ConstraintSupports {
    pub const FABRIC: ConstraintSupports = ConstraintSupports {
        not_null: ConstraintSupport::Enforced,
        primary_key: ConstraintSupport::NotEnforced,
        unique: ConstraintSupport::NotEnforced,
        foreign_key: ConstraintSupport::NotEnforced,
        check: ConstraintSupport::NotSupported,
    };

    pub const ANSI: ConstraintSupports = ConstraintSupports {
        not_null: ConstraintSupport::Enforced,
        primary_key: ConstraintSupport::Enforced,
        unique: ConstraintSupport::Enforced,
        foreign_key: ConstraintSupport::Enforced,
        check: ConstraintSupport::Enforced,
    };
}
