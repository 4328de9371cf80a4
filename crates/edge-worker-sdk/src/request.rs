//! HTTP Request representation for workers

use crate::error::HandlerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Represents an incoming HTTP request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: String,

    /// Full request URL as seen by the host (e.g., "http://localhost:8787/hello?x=1")
    pub url: String,

    /// Request path (e.g., "/api/data")
    pub path: String,

    /// Query parameters
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// HTTP headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request body
    #[serde(default)]
    pub body: Option<String>,

    /// Client IP address
    #[serde(default)]
    pub client_ip: Option<String>,

    /// Request ID for tracing
    #[serde(default)]
    pub request_id: String,
}

impl Request {
    /// Build a request for `method` and `url`, deriving `path` and `query` from the URL.
    ///
    /// # Example
    /// ```ignore
    /// let req = Request::new("GET", "http://localhost/secret?debug=1")?;
    /// assert_eq!(req.path, "/secret");
    /// ```
    pub fn new(method: impl Into<String>, url: &str) -> Result<Self, HandlerError> {
        let parsed = Url::parse(url)
            .map_err(|e| HandlerError::BadRequest(format!("Invalid URL '{}': {}", url, e)))?;

        Ok(Self {
            method: method.into(),
            url: parsed.to_string(),
            path: parsed.path().to_string(),
            query: parsed.query_pairs().into_owned().collect(),
            ..Self::default()
        })
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: "http://localhost/".to_string(),
            path: "/".to_string(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            client_ip: None,
            request_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_path_and_query() {
        let req = Request::new("POST", "https://example.com/api/data?page=2&q=a%20b").unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/data");
        assert_eq!(req.query.get("q").map(String::as_str), Some("a b"));
        assert_eq!(req.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.url, "https://example.com/api/data?page=2&q=a%20b");
    }

    #[test]
    fn test_new_rejects_relative_url() {
        let err = Request::new("GET", "/hello").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_default_is_root_get() {
        let req = Request::default();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        assert!(req.body.is_none());
    }
}
