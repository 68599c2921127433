//! Device activation and deactivation.
//!
//! Both take `{key, deviceId}` in a JSON body. Refusals (unknown key, inactive
//! license, device limit) are ordinary 200 responses with `valid`/`success`
//! set to false; only store failures produce a 5xx.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::Json;
use crate::models::DeviceRequest;
use crate::service::Activation;
use crate::state::AppState;

use super::{flagged_failure, ok};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub activation: Option<Activation>,
    /// Reported alongside a device limit refusal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices_used: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_devices: Option<usize>,
}

impl ActivateResponse {
    fn activated(activation: Activation) -> Self {
        Self {
            valid: true,
            error: None,
            activation: Some(activation),
            devices_used: None,
            max_devices: None,
        }
    }

    fn refused(error: &AppError) -> Self {
        let (devices_used, max_devices) = match error {
            AppError::DeviceLimitExceeded { used, max } => (Some(*used), Some(*max)),
            _ => (None, None),
        };
        Self {
            valid: false,
            error: Some(error.client_message()),
            activation: None,
            devices_used,
            max_devices,
        }
    }
}

/// POST /activate
pub async fn activate_device(
    State(state): State<AppState>,
    Json(body): Json<DeviceRequest>,
) -> Response {
    let key = body.key.as_deref().unwrap_or_default();
    let device_id = body.device_id.as_deref().unwrap_or_default();

    match state.service.activate_device(key, device_id) {
        Ok(activation) => ok(ActivateResponse::activated(activation)),
        Err(e) if e.is_outcome() => ok(ActivateResponse::refused(&e)),
        Err(e) => flagged_failure("valid", e),
    }
}

/// POST /deactivate
pub async fn deactivate_device(
    State(state): State<AppState>,
    Json(body): Json<DeviceRequest>,
) -> Response {
    let key = body.key.as_deref().unwrap_or_default();
    let device_id = body.device_id.as_deref().unwrap_or_default();

    match state.service.deactivate_device(key, device_id) {
        Ok(deactivation) => Json(deactivation).into_response(),
        Err(e) => flagged_failure("success", e),
    }
}
