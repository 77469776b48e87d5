use lambda_http::{http::{HeaderMap, StatusCode}, Body, Error, Response};

use crate::error::{SyncError, WebhookError};
use crate::sync::{sync_user_event, SyncOutcome};
use crate::types::WebhookEvent;
use crate::webhook::{Webhook, WebhookHeaders};
use crate::AppState;

pub const WEBHOOK_PATH: &str = "/clerk-users-webhook";

pub const VERIFICATION_FAILED: &str = "Error validating webhook";
pub const INVALID_EVENT: &str = "Invalid user event data";
pub const PROCESSED: &str = "Webhook processed successfully";

fn text_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(message.to_string().into())
        .map_err(Box::new)?)
}

fn validate_payload(
    webhook: &Webhook,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookEvent, WebhookError> {
    let svix_headers = WebhookHeaders::from_headers(headers)?;
    webhook.verify(body, &svix_headers)
}

/// POST /clerk-users-webhook
///
/// Nothing in the payload is acted on until the signature checks out.
/// Unhandled event types are still acknowledged with 200 so the sender
/// only retries deliveries we could not verify. Store failures surface
/// as handler errors.
pub async fn handle_clerk_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let event = match validate_payload(&state.webhook, headers, body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Webhook verification failed: {}", e);
            return text_response(StatusCode::BAD_REQUEST, VERIFICATION_FAILED);
        }
    };

    tracing::info!("Webhook verified: {}", event.event_type);

    match sync_user_event(state.store.as_ref(), &event).await {
        Ok(SyncOutcome::Upserted { clerk_id, already_existed }) => {
            tracing::info!("User synced: {} (existed: {})", clerk_id, already_existed);
        }
        Ok(SyncOutcome::Ignored { .. }) => {}
        Err(SyncError::InvalidUserData(e)) => {
            tracing::warn!("Verified {} event has malformed data: {}", event.event_type, e);
            return text_response(StatusCode::BAD_REQUEST, INVALID_EVENT);
        }
        Err(SyncError::Store(e)) => {
            tracing::error!("User store failed while handling {}: {}", event.event_type, e);
            return Err(e.into());
        }
    }

    text_response(StatusCode::OK, PROCESSED)
}
