mod capability;
pub use capability::{Capability, ConstraintSupport, ConstraintSupports};

mod response;
pub use response::{Response, ResultSet, Rows};

pub mod operation;
pub use operation::Operation;

use crate::async_trait;

use std::fmt::Debug;

/// A session with the warehouse.
///
/// Implementations receive statements already rendered to SQL; the statement
/// IR travels alongside so test doubles can interpret it without parsing.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a warehouse operation.
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Box<C> {
    async fn exec(&mut self, op: Operation) -> crate::Result<Response> {
        (**self).exec(op).await
    }
}
