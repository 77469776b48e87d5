use idsync_shared::{clerk_webhook, session, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use std::sync::Arc;

fn json_error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}

/// Main Lambda handler - routes webhook deliveries and session lookups
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("Request - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type,Authorization,X-User-Id")
            .body(Body::Empty)
            .map_err(Box::new)?);
    }

    match (method, path) {
        (&Method::POST, clerk_webhook::WEBHOOK_PATH) => {
            clerk_webhook::handle_clerk_webhook(&state, event.headers(), event.body()).await
        }
        (_, clerk_webhook::WEBHOOK_PATH) => {
            json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        (&Method::GET, "/session") => session::get_session(&state.sessions, &event).await,
        _ => json_error(StatusCode::NOT_FOUND, "Not found"),
    }
}
