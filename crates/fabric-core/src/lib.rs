pub mod config;
pub use config::{AdapterConfig, Dialect, Materialization, ModelConfig};

pub mod driver;
pub use driver::{Capability, Connection};

mod error;
pub use error::{Error, IntoError};

pub mod relation;
pub use relation::{Relation, RelationKind, RunId};

pub mod schema;
pub use schema::Column;

pub mod stmt;

/// A Result type alias that uses the adapter's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
