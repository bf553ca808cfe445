use super::Error;
use crate::Relation;

/// Error when an incremental run finds column changes under `on_schema_change: fail`.
#[derive(Debug)]
pub(super) struct SchemaDrift {
    relation: Box<str>,
    summary: Box<str>,
}

impl std::error::Error for SchemaDrift {}

impl core::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "schema drift on {}: {}",
            self.relation, self.summary
        )
    }
}

impl Error {
    /// Creates a schema drift error with a summary of the column differences.
    pub fn schema_drift(relation: &Relation, summary: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SchemaDrift(SchemaDrift {
            relation: relation.to_string().into(),
            summary: summary.into().into(),
        }))
    }

    /// Returns `true` if this error is a schema drift error.
    pub fn is_schema_drift(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::SchemaDrift(_)))
    }
}
