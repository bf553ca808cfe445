use super::{ExprBinaryOp, Value};

/// A predicate or scalar in a generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every expression must hold. An empty list is always true.
    And(Vec<Expr>),

    BinaryOp(ExprBinaryOp),

    Column(ExprColumn),

    /// `expr IN (values...)`
    InList { expr: Box<Expr>, list: Vec<Value> },

    /// `expr IS NULL`, or `IS NOT NULL` when negated
    IsNull { expr: Box<Expr>, negate: bool },

    /// Caller-supplied SQL, rendered verbatim
    Raw(String),

    /// A timestamp literal, cast to the warehouse's timestamp type
    Timestamp(String),

    /// A literal inlined into the statement text
    Value(Value),
}

/// Which side of a two-relation statement a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Rendered bare
    Unqualified,

    /// Qualified with the source alias
    Source,

    /// Qualified with the target alias
    Target,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprColumn {
    pub scope: Scope,
    pub name: String,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            scope: Scope::Unqualified,
            name: name.into(),
        })
    }

    pub fn source(name: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            scope: Scope::Source,
            name: name.into(),
        })
    }

    pub fn target(name: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            scope: Scope::Target,
            name: name.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn timestamp(value: impl Into<String>) -> Expr {
        Expr::Timestamp(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn in_list(expr: impl Into<Expr>, list: impl IntoIterator<Item = Value>) -> Expr {
        Expr::InList {
            expr: Box::new(expr.into()),
            list: list.into_iter().collect(),
        }
    }

    pub fn is_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr.into()),
            negate: false,
        }
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNull {
            expr: Box::new(expr.into()),
            negate: true,
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Expr {
        Expr::Value(value)
    }
}
