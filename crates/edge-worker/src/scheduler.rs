//! Scheduled triggers
//!
//! When `EDGE_WORKER_SCHEDULE_INTERVAL_SECS` is set the host delivers a
//! [`ScheduledEvent`] to the worker on that interval, standing in for a
//! cron trigger.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use edge_worker_sdk::{ContextBuilder, ScheduledEvent};

use crate::AppState;

/// Spawn the trigger loop. The first event fires one `period` after start.
pub fn spawn(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            cron = %state.config.schedule_cron,
            period_secs = period.as_secs(),
            "Scheduled trigger enabled"
        );

        loop {
            ticker.tick().await;
            run_once(&state).await;
        }
    })
}

/// Deliver one scheduled event and wait for its `wait_until` tasks.
///
/// Returns whether the worker completed without error.
pub async fn run_once(state: &Arc<AppState>) -> bool {
    let ctx = ContextBuilder::new()
        .fetcher(Arc::clone(&state.fetcher))
        .build();
    let event = ScheduledEvent::new(state.config.schedule_cron.clone());

    tracing::debug!(request_id = %ctx.request_id, cron = %event.cron, "Dispatching scheduled event");

    let worker = Arc::clone(&state.worker);
    let env = Arc::clone(&state.env);
    let task_ctx = ctx.clone();
    let mut task = tokio::spawn(async move { worker.scheduled(event, &env, &task_ctx).await });

    let timeout = state.config.handler_timeout();
    let succeeded = match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(Ok(()))) => true,
        Ok(Ok(Err(e))) => {
            tracing::error!(request_id = %ctx.request_id, "Scheduled handler failed: {}", e);
            false
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %ctx.request_id, "Scheduled handler panicked: {}", e);
            false
        }
        Err(_) => {
            task.abort();
            tracing::error!(
                request_id = %ctx.request_id,
                timeout_secs = timeout.as_secs(),
                "Scheduled handler timed out"
            );
            false
        }
    };

    ctx.drain().await;
    succeeded
}
