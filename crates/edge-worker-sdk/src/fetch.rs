//! Outbound HTTP for workers
//!
//! Workers reach third-party origins through the [`Fetcher`] held by their
//! [`ExecutionContext`](crate::ExecutionContext). The host installs
//! [`HttpFetcher`] (feature `http-client`); tests install a stub.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::HandlerError;
use crate::handler::BoxFuture;

/// A fully buffered response from an outbound call
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with `HandlerError::Upstream` unless the status is 2xx
    pub fn error_for_status(self, url: &str) -> Result<Self, HandlerError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HandlerError::Upstream(format!(
                "{} returned status {}",
                url, self.status
            )))
        }
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HandlerError::Upstream(format!("Invalid JSON from upstream: {}", e)))
    }

    /// Body as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues outbound GET requests on behalf of a worker
pub trait Fetcher: Send + Sync + 'static {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, HandlerError>>;
}

#[cfg(feature = "http-client")]
pub use http::HttpFetcher;

#[cfg(feature = "http-client")]
mod http {
    use super::*;

    /// [`Fetcher`] backed by a pooled `reqwest::Client`
    ///
    /// No timeout is set here; the host's per-invocation limit bounds the call.
    #[derive(Debug, Clone, Default)]
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Fetcher for HttpFetcher {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, HandlerError>> {
            Box::pin(async move {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| HandlerError::Upstream(format!("Failed to fetch {}: {}", url, e)))?;

                let status = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect();

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| HandlerError::Upstream(format!("Failed to read body from {}: {}", url, e)))?;

                tracing::debug!(url = %url, status, bytes = body.len(), "Outbound fetch completed");

                Ok(FetchResponse { status, headers, body })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_json_parsing() {
        let response = FetchResponse::new(200, r#"{"id":1,"completed":false}"#);
        let value: Value = response.json().unwrap();
        assert_eq!(value, json!({"id": 1, "completed": false}));
    }

    #[test]
    fn test_malformed_json_is_upstream_error() {
        let response = FetchResponse::new(200, "<html>oops</html>");
        let err = response.json::<Value>().unwrap_err();
        assert!(matches!(err, HandlerError::Upstream(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_error_for_status() {
        assert!(FetchResponse::new(204, "").error_for_status("http://a").is_ok());

        let err = FetchResponse::new(503, "busy")
            .error_for_status("http://upstream/x")
            .unwrap_err();
        assert_eq!(err.to_string(), "Upstream error: http://upstream/x returned status 503");
    }
}
