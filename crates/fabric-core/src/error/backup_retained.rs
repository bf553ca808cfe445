use super::Error;
use crate::Relation;

/// Error raised when a publish swap fails after the previous object was moved
/// aside.
///
/// The previous target still exists under the backup name. Operators restore
/// it by renaming the backup back, so the error carries the backup relation.
#[derive(Debug)]
pub(super) struct BackupRetained {
    target: Relation,
    backup: Relation,
}

impl std::error::Error for BackupRetained {}

impl core::fmt::Display for BackupRetained {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "publishing {} failed; previous version retained as {}",
            self.target, self.backup
        )
    }
}

impl Error {
    /// Creates an error reporting that `target`'s previous version survives as `backup`.
    pub fn backup_retained(target: &Relation, backup: &Relation) -> Error {
        Error::from(super::ErrorKind::BackupRetained(BackupRetained {
            target: target.clone(),
            backup: backup.clone(),
        }))
    }

    /// Returns `true` if this error reports a retained backup.
    pub fn is_backup_retained(&self) -> bool {
        self.backup().is_some()
    }

    /// Returns the retained backup relation, if any error in the chain carries one.
    pub fn backup(&self) -> Option<&Relation> {
        self.chain().find_map(|err| match err.kind() {
            super::ErrorKind::BackupRetained(retained) => Some(&retained.backup),
            _ => None,
        })
    }
}
