use super::Error;

/// Error when a query result has an unexpected shape.
///
/// This occurs when:
/// - a catalog query returns fewer columns than expected
/// - a relation kind is neither a table nor a view
/// - a count comes back as something other than an integer
///
/// The warehouse answered, but not in the form the adapter asked for.
#[derive(Debug)]
pub(super) struct InvalidResult {
    message: Box<str>,
}

impl std::error::Error for InvalidResult {}

impl core::fmt::Display for InvalidResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid result: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid result error.
    pub fn invalid_result(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidResult(InvalidResult {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid result error.
    pub fn is_invalid_result(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidResult(_)))
    }
}
