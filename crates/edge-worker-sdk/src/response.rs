//! HTTP Response representation for workers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents an outgoing HTTP response.
///
/// # Quick Reference
///
/// | Method | Status | Content-Type |
/// |--------|--------|--------------|
/// | `new_text(body)` | 200 | none (host default) |
/// | `json(status, body)` | any | `application/json` |
/// | `ok(body)` | 200 | `application/json` |
/// | `redirect(status, location)` | any | none |
///
/// Header names are matched case-insensitively by [`Response::header`] and
/// replaced case-insensitively by [`Response::with_header`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body
    #[serde(default)]
    pub body: Option<String>,
}

impl Response {
    /// Create a new response with the given status code (no body).
    ///
    /// # Example
    /// ```ignore
    /// Response::new(204) // 204 No Content
    /// Response::new(301).with_header("Location", "/new-path")
    /// ```
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a 200 response carrying `body` and no explicit Content-Type.
    ///
    /// The host fills in `text/plain;charset=UTF-8` on the wire.
    ///
    /// # Example
    /// ```ignore
    /// Response::new_text("Hello!")
    /// Response::new_text("Something broke").with_status(500)
    /// ```
    pub fn new_text(body: impl Into<String>) -> Self {
        Self::new(200).with_body(body)
    }

    /// Create a 200 OK response with JSON body.
    pub fn ok<T: Serialize>(body: T) -> Self {
        Self::json(200, body)
    }

    /// Create a JSON response with a custom status code.
    ///
    /// # Example
    /// ```ignore
    /// Response::json(201, json!({"id": "new-id"}))
    /// Response::json(400, json!({"error": "Invalid input"}))
    /// ```
    pub fn json<T: Serialize>(status: u16, body: T) -> Self {
        Self {
            status,
            headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body: serde_json::to_string(&body).ok(),
        }
    }

    /// Create a redirect response.
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::new(status).with_header("Location", location)
    }

    /// Set the status code (builder pattern).
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response (builder pattern).
    ///
    /// An existing header with the same name in any letter case is replaced.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value.into());
        self
    }

    /// Set the body (builder pattern).
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value (case-insensitive lookup).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}
