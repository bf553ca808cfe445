mod adhoc;
mod ambiguous_catalog;
mod backup_retained;
mod capability_violation;
mod contract_mismatch;
mod dependency_cycle;
mod invalid_config;
mod invalid_relation;
mod invalid_result;
mod schema_drift;
mod warehouse;

use adhoc::AdhocError;
use ambiguous_catalog::AmbiguousCatalog;
use backup_retained::BackupRetained;
use capability_violation::CapabilityViolation;
use contract_mismatch::ContractMismatch;
use dependency_cycle::DependencyCycle;
use invalid_config::InvalidConfig;
use invalid_relation::InvalidRelation;
use invalid_result::InvalidResult;
use schema_drift::SchemaDrift;
use std::sync::Arc;
use warehouse::WarehouseError;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error raised while introspecting or materializing warehouse relations.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;

        let attached = match err.inner.as_mut().and_then(Arc::get_mut) {
            Some(inner) if inner.cause.is_none() => {
                inner.cause = Some(self.clone());
                true
            }
            _ => false,
        };

        if attached {
            return err;
        }

        // The consequent is shared or already chained; keep its message and
        // hang the cause off a fresh node.
        Error {
            inner: Some(Arc::new(ErrorInner {
                kind: ErrorKind::Adhoc(AdhocError::new(err.kind().to_string())),
                cause: Some(self),
            })),
        }
    }

    /// Creates an ad-hoc error from format arguments. Prefer the `err!` and
    /// `bail!` macros.
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::from_args(args)))
    }

    /// Returns the innermost error of the chain.
    pub fn root(&self) -> &Error {
        let mut root = self;
        for err in self.chain() {
            root = err;
        }
        root
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    /// Returns `true` if any error in the chain satisfies `f`.
    fn any(&self, f: impl Fn(&ErrorKind) -> bool) -> bool {
        self.chain().any(|err| f(err.kind()))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Warehouse(err) => err.source(),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    AmbiguousCatalog(AmbiguousCatalog),
    BackupRetained(BackupRetained),
    CapabilityViolation(CapabilityViolation),
    ContractMismatch(ContractMismatch),
    DependencyCycle(DependencyCycle),
    InvalidConfig(InvalidConfig),
    InvalidRelation(InvalidRelation),
    InvalidResult(InvalidResult),
    SchemaDrift(SchemaDrift),
    Warehouse(WarehouseError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            AmbiguousCatalog(err) => core::fmt::Display::fmt(err, f),
            BackupRetained(err) => core::fmt::Display::fmt(err, f),
            CapabilityViolation(err) => core::fmt::Display::fmt(err, f),
            ContractMismatch(err) => core::fmt::Display::fmt(err, f),
            DependencyCycle(err) => core::fmt::Display::fmt(err, f),
            InvalidConfig(err) => core::fmt::Display::fmt(err, f),
            InvalidRelation(err) => core::fmt::Display::fmt(err, f),
            InvalidResult(err) => core::fmt::Display::fmt(err, f),
            SchemaDrift(err) => core::fmt::Display::fmt(err, f),
            Warehouse(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown fabric adapter error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::invalid_config(err.to_string())
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
