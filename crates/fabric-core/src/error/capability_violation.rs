use super::Error;
use crate::Relation;

/// Error when a materialization needs an operation the warehouse dialect lacks.
///
/// This occurs when:
/// - `ALTER TABLE` column changes are requested on a warehouse without them
/// - a `merge` strategy runs against a dialect without `MERGE`
/// - contract enforcement meets a query with nested CTEs
/// - a rename would move an object across schemas
///
/// Raised before any DDL touches the target.
#[derive(Debug)]
pub(super) struct CapabilityViolation {
    relation: Box<str>,
    operation: Box<str>,
}

impl std::error::Error for CapabilityViolation {}

impl core::fmt::Display for CapabilityViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "capability violation: {} is not supported by the warehouse (relation {})",
            self.operation, self.relation
        )
    }
}

impl Error {
    /// Creates a capability violation for `operation` on `relation`.
    pub fn capability_violation(relation: &Relation, operation: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::CapabilityViolation(CapabilityViolation {
            relation: relation.to_string().into(),
            operation: operation.into().into(),
        }))
    }

    /// Returns `true` if this error is a capability violation.
    pub fn is_capability_violation(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::CapabilityViolation(_)))
    }
}
