//! CQRS module
//!
//! Commands change state, queries read it. Each message type names itself
//! and declares its output; a bus maps message names to the handler
//! registered for them. [`CqrsRegistry`] builds both buses once at startup.

mod bus;
mod registry;

pub use bus::{CommandBus, QueryBus};
pub use registry::CqrsRegistry;

use async_trait::async_trait;

use crate::domain::OperationContext;
use crate::error::AppResult;

/// A request to change state
pub trait Command: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Dispatch key, unique across commands
    const NAME: &'static str;
}

/// A request to read state
pub trait Query: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Dispatch key, unique across queries
    const NAME: &'static str;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C, ctx: &OperationContext) -> AppResult<C::Output>;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(&self, query: Q, ctx: &OperationContext) -> AppResult<Q::Output>;
}
