use super::Error;

/// Error reported by the warehouse while executing a statement.
#[derive(Debug)]
pub(super) struct WarehouseError {
    message: Box<str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl WarehouseError {
    pub(super) fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl core::fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "warehouse error: {}", self.message)?;
        let mut source = self.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

impl Error {
    /// Creates a warehouse error from a message.
    pub fn warehouse(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Warehouse(WarehouseError {
            message: message.into().into(),
            source: None,
        }))
    }

    /// Creates a warehouse error from a driver error.
    ///
    /// This is the preferred way for connection implementations to surface
    /// client library failures.
    pub fn from_driver(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Error {
        Error::from(super::ErrorKind::Warehouse(WarehouseError {
            message: message.into().into(),
            source: Some(Box::new(err)),
        }))
    }

    /// Returns `true` if this error came from the warehouse.
    pub fn is_warehouse(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::Warehouse(_)))
    }
}
