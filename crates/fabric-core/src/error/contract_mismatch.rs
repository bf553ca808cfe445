use super::Error;
use crate::Relation;

/// Error when the columns a query produces differ from its declared contract.
#[derive(Debug)]
pub(super) struct ContractMismatch {
    relation: Box<str>,
    message: Box<str>,
}

impl std::error::Error for ContractMismatch {}

impl core::fmt::Display for ContractMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "contract mismatch for {}: {}",
            self.relation, self.message
        )
    }
}

impl Error {
    /// Creates a contract mismatch error.
    pub fn contract_mismatch(relation: &Relation, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ContractMismatch(ContractMismatch {
            relation: relation.to_string().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a contract mismatch.
    pub fn is_contract_mismatch(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ContractMismatch(_)))
    }
}
