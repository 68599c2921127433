//! Payment event ingestion.
//!
//! `checkout.session.completed` creates a license for the checkout's email and
//! session id. Other event types are acknowledged and ignored. Replayed events
//! are not deduplicated: each delivery issues a new key.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{AppError, msg};
use crate::extractors::Json;
use crate::payments::{StripeCheckoutSession, StripeWebhookEvent};
use crate::state::AppState;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Serialize)]
pub struct LicenseCreatedResponse {
    pub success: bool,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

/// Result type for webhook rejections.
type WebhookResult = (StatusCode, String);

fn reject((status, error): WebhookResult) -> Response {
    (status, Json(serde_json::json!({ "error": error }))).into_response()
}

fn extract_signature(headers: &HeaderMap) -> Result<&str, WebhookResult> {
    headers
        .get("stripe-signature")
        .ok_or_else(|| (StatusCode::BAD_REQUEST, msg::MISSING_SIGNATURE.to_string()))?
        .to_str()
        .map_err(|e| {
            tracing::debug!("Invalid UTF-8 in Stripe signature header: {}", e);
            (StatusCode::BAD_REQUEST, msg::INVALID_SIGNATURE_FORMAT.to_string())
        })
}

fn verify(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<(), WebhookResult> {
    let Some(verifier) = &state.stripe_verifier else {
        return Ok(());
    };

    let signature = extract_signature(headers)?;
    match verifier.verify_webhook_signature(body, signature) {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!("Stripe webhook rejected: signature mismatch");
            Err((StatusCode::UNAUTHORIZED, msg::INVALID_SIGNATURE.to_string()))
        }
        Err(e @ AppError::BadRequest(_)) => Err((StatusCode::BAD_REQUEST, e.client_message())),
        Err(e) => {
            tracing::error!("Signature verification error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signature verification failed".to_string(),
            ))
        }
    }
}

/// POST /webhook
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = verify(&state, &headers, &body) {
        return reject(rejection);
    }

    let event: StripeWebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Failed to parse Stripe webhook: {}", e);
            return reject((StatusCode::BAD_REQUEST, "Invalid JSON".to_string()));
        }
    };

    if event.event_type != CHECKOUT_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "Ignoring Stripe event");
        return Json(ReceivedResponse { received: true }).into_response();
    }

    let session: StripeCheckoutSession = match serde_json::from_value(event.data.object) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to parse checkout session: {}", e);
            return reject((StatusCode::BAD_REQUEST, "Invalid checkout session".to_string()));
        }
    };

    match state.service.create_license(session.email(), &session.id) {
        Ok(key) => Json(LicenseCreatedResponse { success: true, key }).into_response(),
        // 5xx so the provider retries delivery
        Err(e) => e.into_response(),
    }
}
