//! Execution context for worker events
//!
//! The [`ExecutionContext`] gives a worker:
//! - the request identifier used in every log line
//! - outbound HTTP via [`ExecutionContext::fetch`]
//! - [`ExecutionContext::wait_until`] for work that may outlive the response
//!
//! The host creates one context per event and calls [`ExecutionContext::drain`]
//! once the response has been handed back.

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::HandlerError;
use crate::fetch::{FetchResponse, Fetcher};
use crate::handler::BoxFuture;

/// Request identifier for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Create a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from a string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fetcher used when the host did not install one
struct UnconfiguredFetcher;

impl Fetcher for UnconfiguredFetcher {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, HandlerError>> {
        Box::pin(async move {
            Err(HandlerError::Internal(format!(
                "No outbound fetcher configured (requested {})",
                url
            )))
        })
    }
}

/// Context passed to every worker event
///
/// Cheap to clone; clones share the same `wait_until` task list.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Unique request identifier
    pub request_id: RequestId,

    fetcher: Arc<dyn Fetcher>,

    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ExecutionContext {
    /// Create a new context with a fresh request ID
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        ContextBuilder::new().fetcher(fetcher).build()
    }

    /// Issue an outbound GET request
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, HandlerError> {
        self.fetcher.get(url).await
    }

    /// Keep `future` running after the response has been sent.
    ///
    /// The future starts immediately on the tokio runtime.
    pub fn wait_until<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }

    /// Number of `wait_until` tasks not yet collected by [`drain`](Self::drain)
    pub fn pending_tasks(&self) -> usize {
        match self.tasks.lock() {
            Ok(tasks) => tasks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Await every `wait_until` task, including ones registered while draining.
    ///
    /// Returns the number of tasks collected. Panicked tasks are logged.
    pub async fn drain(&self) -> usize {
        let mut collected = 0;
        loop {
            let batch: Vec<JoinHandle<()>> = match self.tasks.lock() {
                Ok(mut tasks) => tasks.drain(..).collect(),
                Err(poisoned) => poisoned.into_inner().drain(..).collect(),
            };
            if batch.is_empty() {
                return collected;
            }

            for handle in batch {
                collected += 1;
                if let Err(e) = handle.await {
                    tracing::warn!(request_id = %self.request_id, "wait_until task failed: {}", e);
                }
            }
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("request_id", &self.request_id)
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

/// Builder for creating ExecutionContext instances
#[derive(Default)]
pub struct ContextBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    request_id: Option<RequestId>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outbound fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the request ID
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Build the context
    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            request_id: self.request_id.unwrap_or_default(),
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(UnconfiguredFetcher)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher;

    impl Fetcher for StaticFetcher {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, HandlerError>> {
            Box::pin(async move { Ok(FetchResponse::new(200, url.to_string())) })
        }
    }

    #[test]
    fn test_request_id() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2);

        let id3 = RequestId::from_string("test-id".to_string());
        assert_eq!(id3.as_str(), "test-id");
    }

    #[tokio::test]
    async fn test_context_builder() {
        let ctx = ContextBuilder::new()
            .fetcher(Arc::new(StaticFetcher))
            .request_id(RequestId::from_string("req-123".to_string()))
            .build();

        assert_eq!(ctx.request_id.as_str(), "req-123");
        let response = ctx.fetch("https://example.com/x").await.unwrap();
        assert_eq!(response.text(), "https://example.com/x");
    }

    #[tokio::test]
    async fn test_fetch_without_fetcher_fails() {
        let ctx = ContextBuilder::new().build();
        let err = ctx.fetch("https://example.com").await.unwrap_err();
        assert!(matches!(err, HandlerError::Internal(_)));
    }

    #[tokio::test]
    async fn test_wait_until_runs_to_completion() {
        let ctx = ContextBuilder::new().build();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            ctx.wait_until(async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(ctx.pending_tasks(), 3);

        assert_eq!(ctx.drain().await, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.pending_tasks(), 0);
    }

    #[tokio::test]
    async fn test_drain_survives_panicking_task() {
        let ctx = ContextBuilder::new().build();
        ctx.wait_until(async { panic!("boom") });
        ctx.wait_until(async {});
        assert_eq!(ctx.drain().await, 2);
    }

    #[tokio::test]
    async fn test_clones_share_tasks() {
        let ctx = ContextBuilder::new().build();
        let clone = ctx.clone();
        clone.wait_until(async {});
        assert_eq!(ctx.pending_tasks(), 1);
        assert_eq!(ctx.drain().await, 1);
    }
}
