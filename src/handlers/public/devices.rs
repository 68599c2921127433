use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;

use crate::extractors::Query;
use crate::state::AppState;

use super::{flagged_failure, ok};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDeviceQuery {
    #[serde(default)]
    pub device_id: Option<String>,
}

/// GET /check-device?deviceId=...
///
/// Device recovery after a reinstall: tells a device which license it was
/// activated with, if any. Never reports an error for an unknown device.
pub async fn check_device(
    State(state): State<AppState>,
    Query(query): Query<CheckDeviceQuery>,
) -> Response {
    let device_id = query.device_id.as_deref().unwrap_or_default();

    match state.service.check_device(device_id) {
        Ok(check) => ok(check),
        Err(e) => flagged_failure("activated", e),
    }
}
