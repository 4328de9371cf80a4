//! Starter edge worker
//!
//! Routes four fixed paths and logs scheduled triggers. The host links this
//! crate in and calls it through the [`Worker`] trait.

use edge_worker_sdk::prelude::*;

pub mod handler;

/// The starter worker. Stateless; one value serves every invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorker;

impl Worker for HelloWorker {
    fn fetch<'a>(
        &'a self,
        req: Request,
        env: &'a Env,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<Response, HandlerError>> {
        Box::pin(handler::handle(req, env, ctx))
    }

    fn scheduled<'a>(
        &'a self,
        event: ScheduledEvent,
        _env: &'a Env,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            tracing::info!(
                request_id = %ctx.request_id,
                cron = %event.cron,
                scheduled_time = %event.scheduled_time,
                "Scheduled event triggered!"
            );
            Ok(())
        })
    }
}
