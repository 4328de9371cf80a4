//! Worker router - turns every incoming HTTP request into a worker `fetch` event
//!
//! The host plays the part of the edge runtime: it builds the SDK request,
//! enforces the body and time limits, and converts the worker's response
//! back into HTTP.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use edge_worker_sdk::{ContextBuilder, ExecutionContext, RequestId};

use crate::AppState;

/// Content type the host applies when a worker returns a body without one
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Create the router that sends every method and path to the worker
pub fn create_worker_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", any(handle_worker_request))
        .route("/{*path}", any(handle_worker_request))
}

/// Handle an incoming request by invoking the worker
async fn handle_worker_request(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Incoming request"
    );

    let sdk_request = match into_sdk_request(request, request_id.clone(), state.config.max_body_bytes).await {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    let ctx = ContextBuilder::new()
        .fetcher(Arc::clone(&state.fetcher))
        .request_id(RequestId::from_string(request_id))
        .build();

    let response = invoke_worker(&state, sdk_request, &ctx).await;

    if ctx.pending_tasks() > 0 {
        state.background.spawn(async move {
            let drained = ctx.drain().await;
            tracing::debug!(request_id = %ctx.request_id, drained, "wait_until tasks finished");
        });
    }

    response
}

/// Run the worker under the host's time limit
async fn invoke_worker(
    state: &Arc<AppState>,
    req: edge_worker_sdk::Request,
    ctx: &ExecutionContext,
) -> Response {
    let worker = Arc::clone(&state.worker);
    let env = Arc::clone(&state.env);
    let task_ctx = ctx.clone();

    let mut task = tokio::spawn(async move {
        edge_worker_sdk::fetch_or_error(worker.as_ref(), req, &env, &task_ctx).await
    });

    let timeout = state.config.handler_timeout();
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(sdk_response)) => into_http_response(sdk_response),
        Ok(Err(e)) => {
            tracing::error!(request_id = %ctx.request_id, "Worker panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Worker panicked").into_response()
        }
        Err(_) => {
            task.abort();
            tracing::error!(
                request_id = %ctx.request_id,
                timeout_secs = timeout.as_secs(),
                "Worker execution timed out"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Worker execution timed out").into_response()
        }
    }
}

/// Build the SDK request, reading at most `max_body_bytes` of body
pub async fn into_sdk_request(
    request: Request<Body>,
    request_id: String,
    max_body_bytes: usize,
) -> Result<edge_worker_sdk::Request, Response> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("http://{}{}", host, path_and_query);

    let query: HashMap<String, String> = request
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let headers = flatten_headers(request.headers());
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string());

    let body_bytes = match axum::body::to_bytes(request.into_body(), max_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            let too_large = e
                .into_inner()
                .downcast_ref::<http_body_util::LengthLimitError>()
                .is_some();
            if too_large {
                tracing::warn!(request_id = %request_id, max_body_bytes, "Request body too large");
                return Err((StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response());
            }
            tracing::error!(request_id = %request_id, "Failed to read body");
            return Err((StatusCode::BAD_REQUEST, "Failed to read body").into_response());
        }
    };

    let body = if body_bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body_bytes).to_string())
    };

    Ok(edge_worker_sdk::Request {
        method,
        url,
        path,
        query,
        headers,
        body,
        client_ip,
        request_id,
    })
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect()
}

/// Convert the worker's response into an HTTP response
pub fn into_http_response(sdk_response: edge_worker_sdk::Response) -> Response {
    let Ok(status) = StatusCode::from_u16(sdk_response.status) else {
        tracing::error!(status = sdk_response.status, "Worker returned an invalid status code");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Worker returned an invalid status code").into_response();
    };
    let needs_default_type = sdk_response.body.is_some() && sdk_response.content_type().is_none();

    let mut builder = Response::builder().status(status);

    for (key, value) in &sdk_response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if needs_default_type {
        builder = builder.header(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    match builder.body(Body::from(sdk_response.body.unwrap_or_default())) {
        Ok(response) => response,
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response(),
    }
}
