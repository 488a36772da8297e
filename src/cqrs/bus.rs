//! Dispatch tables
//!
//! Handlers are stored type-erased as `Arc<dyn CommandHandler<C>>` inside
//! a `Box<dyn Any>` and recovered by downcasting with the message type
//! the caller executes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::OperationContext;
use crate::error::{AppError, AppResult};

use super::{Command, CommandHandler, Query, QueryHandler};

type Erased = Box<dyn Any + Send + Sync>;

// =========================================================================
// CommandBus
// =========================================================================

#[derive(Default)]
pub struct CommandBus {
    handlers: HashMap<&'static str, Erased>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `C`, replacing any earlier registration
    pub fn register<C, H>(&mut self, handler: H)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        if self.handlers.insert(C::NAME, Box::new(handler)).is_some() {
            tracing::debug!(command = C::NAME, "Replaced command handler");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub async fn execute<C: Command>(
        &self,
        command: C,
        ctx: &OperationContext,
    ) -> AppResult<C::Output> {
        let handler = self
            .handlers
            .get(C::NAME)
            .and_then(|h| h.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .cloned()
            .ok_or(AppError::HandlerNotFound(C::NAME))?;

        tracing::debug!(
            command = C::NAME,
            correlation_id = ?ctx.correlation_id,
            "Dispatching command"
        );
        handler.handle(command, ctx).await
    }
}

// =========================================================================
// QueryBus
// =========================================================================

#[derive(Default)]
pub struct QueryBus {
    handlers: HashMap<&'static str, Erased>,
}

impl QueryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `Q`, replacing any earlier registration
    pub fn register<Q, H>(&mut self, handler: H)
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        if self.handlers.insert(Q::NAME, Box::new(handler)).is_some() {
            tracing::debug!(query = Q::NAME, "Replaced query handler");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub async fn execute<Q: Query>(&self, query: Q, ctx: &OperationContext) -> AppResult<Q::Output> {
        let handler = self
            .handlers
            .get(Q::NAME)
            .and_then(|h| h.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .cloned()
            .ok_or(AppError::HandlerNotFound(Q::NAME))?;

        handler.handle(query, ctx).await
    }
}
