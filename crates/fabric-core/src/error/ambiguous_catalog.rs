use super::Error;
use crate::Relation;

/// Error when a catalog lookup that must be unique matches several objects.
///
/// Both a table and a view named the same way in one schema, or a catalog
/// view returning duplicate rows, end up here. The adapter refuses to guess
/// which object the model owns.
#[derive(Debug)]
pub(super) struct AmbiguousCatalog {
    relation: Box<str>,
    matches: usize,
}

impl std::error::Error for AmbiguousCatalog {}

impl core::fmt::Display for AmbiguousCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ambiguous catalog: {} objects match {}",
            self.matches, self.relation
        )
    }
}

impl Error {
    /// Creates an ambiguous catalog error for a lookup that matched `matches` objects.
    pub fn ambiguous_catalog(relation: &Relation, matches: usize) -> Error {
        Error::from(super::ErrorKind::AmbiguousCatalog(AmbiguousCatalog {
            relation: relation.to_string().into(),
            matches,
        }))
    }

    /// Returns `true` if this error is an ambiguous catalog error.
    pub fn is_ambiguous_catalog(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::AmbiguousCatalog(_)))
    }
}
