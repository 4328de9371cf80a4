//! Edge Worker SDK - Types and utilities for writing edge workers
//!
//! This crate provides the core types and traits a worker uses to interact
//! with its host: requests and responses, environment bindings, the
//! per-event execution context and outbound HTTP.

pub mod context;
pub mod env;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod request;
pub mod response;

pub mod prelude {
    //! Common imports for edge workers
    pub use crate::context::{ContextBuilder, ExecutionContext, RequestId};
    pub use crate::env::{Binding, Env};
    pub use crate::error::HandlerError;
    pub use crate::fetch::{FetchResponse, Fetcher};
    pub use crate::handler::{BoxFuture, ScheduledEvent, Worker};
    pub use crate::request::Request;
    pub use crate::response::Response;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value as JsonValue};
}

// Re-export key types at crate root
pub use context::{ContextBuilder, ExecutionContext, RequestId};
pub use env::{Binding, Env};
pub use error::HandlerError;
pub use fetch::{FetchResponse, Fetcher};
pub use handler::{fetch_or_error, BoxFuture, ScheduledEvent, Worker};
pub use request::Request;
pub use response::Response;

#[cfg(feature = "http-client")]
pub use fetch::HttpFetcher;
