use super::Error;

/// Error when a relation name cannot exist in the warehouse.
#[derive(Debug)]
pub(super) struct InvalidRelation {
    message: Box<str>,
}

impl std::error::Error for InvalidRelation {}

impl core::fmt::Display for InvalidRelation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid relation: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid relation error.
    pub fn invalid_relation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidRelation(InvalidRelation {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid relation error.
    pub fn is_invalid_relation(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidRelation(_)))
    }
}
