use super::Error;
use crate::Relation;

/// Error when walking view dependents finds a cycle or exceeds the depth cap.
#[derive(Debug)]
pub(super) struct DependencyCycle {
    root: Box<str>,
    message: Box<str>,
}

impl std::error::Error for DependencyCycle {}

impl core::fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "dependency cycle while dropping {}: {}",
            self.root, self.message
        )
    }
}

impl Error {
    /// Creates a dependency cycle error rooted at `root`.
    pub fn dependency_cycle(root: &Relation, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DependencyCycle(DependencyCycle {
            root: root.to_string().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a dependency cycle error.
    pub fn is_dependency_cycle(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::DependencyCycle(_)))
    }
}
