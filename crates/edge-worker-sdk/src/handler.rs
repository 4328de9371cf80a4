//! The worker trait and event types
//!
//! A worker is a value implementing [`Worker`]. The host calls
//! [`Worker::fetch`] for every HTTP request and [`Worker::scheduled`] for every
//! scheduled trigger. Both receive the bindings and a per-event
//! [`ExecutionContext`].
//!
//! # Example
//!
//! ```ignore
//! use edge_worker_sdk::prelude::*;
//!
//! struct Echo;
//!
//! impl Worker for Echo {
//!     fn fetch<'a>(
//!         &'a self,
//!         req: Request,
//!         _env: &'a Env,
//!         _ctx: &'a ExecutionContext,
//!     ) -> BoxFuture<'a, Result<Response, HandlerError>> {
//!         Box::pin(async move { Ok(Response::new_text(req.path)) })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Env, ExecutionContext, HandlerError, Request, Response};

/// Type alias for boxed future returned by workers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A scheduled trigger delivered to [`Worker::scheduled`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Cron expression the trigger was configured with
    pub cron: String,

    /// When the trigger fired
    pub scheduled_time: DateTime<Utc>,
}

impl ScheduledEvent {
    pub fn new(cron: impl Into<String>) -> Self {
        Self {
            cron: cron.into(),
            scheduled_time: Utc::now(),
        }
    }
}

/// An edge worker
pub trait Worker: Send + Sync + 'static {
    /// Handle one HTTP request
    fn fetch<'a>(
        &'a self,
        req: Request,
        env: &'a Env,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<Response, HandlerError>>;

    /// Handle one scheduled trigger. Does nothing unless overridden.
    fn scheduled<'a>(
        &'a self,
        _event: ScheduledEvent,
        _env: &'a Env,
        _ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Run `fetch` and fold any error into its error response
pub async fn fetch_or_error<W: Worker + ?Sized>(
    worker: &W,
    req: Request,
    env: &Env,
    ctx: &ExecutionContext,
) -> Response {
    match worker.fetch(req, env, ctx).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(request_id = %ctx.request_id, "Worker returned error: {}", err);
            err.to_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContextBuilder;

    struct Failing;

    impl Worker for Failing {
        fn fetch<'a>(
            &'a self,
            _req: Request,
            _env: &'a Env,
            _ctx: &'a ExecutionContext,
        ) -> BoxFuture<'a, Result<Response, HandlerError>> {
            Box::pin(async { Err(HandlerError::BadRequest("test error".to_string())) })
        }
    }

    #[tokio::test]
    async fn test_handler_error_conversion() {
        let ctx = ContextBuilder::new().build();
        let response = fetch_or_error(&Failing, Request::default(), &Env::new(), &ctx).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_default_scheduled_is_noop() {
        let ctx = ContextBuilder::new().build();
        let event = ScheduledEvent::new("*/5 * * * *");
        assert!(Failing.scheduled(event, &Env::new(), &ctx).await.is_ok());
        assert_eq!(ctx.pending_tasks(), 0);
    }
}
