use edge_worker_sdk::prelude::*;

/// Third-party resource proxied by `/api/data`
pub const DATA_URL: &str = "https://jsonplaceholder.typicode.com/todos/1";

pub const SECRET_BINDING: &str = "MY_SECRET";

const SECRET_PREVIEW_CHARS: usize = 3;

pub const HELLO_BODY: &str = "Hello from the Worker!";
pub const WELCOME_BODY: &str = "Welcome to the Worker! Try /hello or /api/data";
pub const MISSING_SECRET_BODY: &str = "MY_SECRET environment variable not set.";

/// Route a request by exact path match. Every method is treated the same.
///
/// ```text
/// /hello     -> 200 "Hello from the Worker!"
/// /api/data  -> 200 application/json, relayed from DATA_URL
/// /secret    -> 200 secret preview, or 500 when MY_SECRET is unset
/// *          -> 200 text/plain welcome
/// ```
pub async fn handle(
    req: Request,
    env: &Env,
    ctx: &ExecutionContext,
) -> Result<Response, HandlerError> {
    tracing::info!(
        request_id = %ctx.request_id,
        "Received a {} request for {}",
        req.method,
        req.path
    );

    match req.path.as_str() {
        "/hello" => Ok(hello()),
        "/api/data" => api_data(ctx).await,
        "/secret" => Ok(secret(env)),
        _ => Ok(welcome()),
    }
}

fn hello() -> Response {
    Response::new_text(HELLO_BODY)
}

/// Fetch DATA_URL and re-serialize its JSON body
async fn api_data(ctx: &ExecutionContext) -> Result<Response, HandlerError> {
    let upstream = ctx.fetch(DATA_URL).await?.error_for_status(DATA_URL)?;
    let data: JsonValue = upstream.json()?;
    Ok(Response::json(200, data))
}

fn secret(env: &Env) -> Response {
    // An empty value counts as unset
    match env.get(SECRET_BINDING).map(Binding::value).filter(|v| !v.is_empty()) {
        Some(value) => {
            let preview: String = value.chars().take(SECRET_PREVIEW_CHARS).collect();
            Response::new_text(format!("My secret value starts with: {}...", preview))
        }
        None => Response::new_text(MISSING_SECRET_BODY).with_status(500),
    }
}

fn welcome() -> Response {
    Response::new_text(WELCOME_BODY).with_header("Content-Type", "text/plain")
}
