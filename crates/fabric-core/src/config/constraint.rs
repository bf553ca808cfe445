use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    NotNull,
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Custom,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::NotNull => "not_null",
            ConstraintKind::PrimaryKey => "primary_key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign_key",
            ConstraintKind::Check => "check",
            ConstraintKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint declared on a column or on the model.
///
/// Column-level constraints leave `columns` empty; the owning column is
/// implied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConstraintSpec {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub columns: Vec<String>,

    /// Check expression, or the referenced relation and columns of a foreign
    /// key written as `other_table (id)`.
    #[serde(default)]
    pub expression: Option<String>,

    /// Rendered relation a foreign key points to.
    #[serde(default)]
    pub to: Option<String>,

    #[serde(default)]
    pub to_columns: Vec<String>,
}

impl ConstraintSpec {
    pub fn new(kind: ConstraintKind) -> ConstraintSpec {
        ConstraintSpec {
            kind,
            name: None,
            columns: vec![],
            expression: None,
            to: None,
            to_columns: vec![],
        }
    }

    pub fn on_columns<I, S>(mut self, columns: I) -> ConstraintSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> ConstraintSpec {
        self.name = Some(name.into());
        self
    }
}
