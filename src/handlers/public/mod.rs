mod activation;
mod devices;
mod lookup;
mod validate;

pub use activation::*;
pub use devices::*;
pub use lookup::*;
pub use validate::*;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::extractors::Json;
use crate::rate_limit;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "PAKT License API";
pub const API_VERSION: u32 = 3;
pub const ENDPOINTS: &[&str] = &[
    "/webhook",
    "/activate",
    "/validate",
    "/check-device",
    "/lookup",
    "/success",
    "/deactivate",
];

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ServiceIndex {
    pub service: &'static str,
    pub version: u32,
    pub endpoints: &'static [&'static str],
}

/// Any unmatched path answers with the service description.
pub async fn service_index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        service: SERVICE_NAME,
        version: API_VERSION,
        endpoints: ENDPOINTS,
    })
}

/// Render a failed request in the route's own shape: `{<flag>: false, error}`.
/// Expected outcomes come back as 200, service failures as 5xx.
pub(crate) fn flagged_failure(flag: &'static str, error: AppError) -> Response {
    error.log();
    let mut body = Map::new();
    body.insert(flag.to_string(), Value::Bool(false));
    body.insert("error".to_string(), Value::String(error.client_message()));
    let status = error.status();
    (status, Json(Value::Object(body))).into_response()
}

pub(crate) fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    let mut license_routes = Router::new()
        .route("/activate", post(activate_device))
        .route("/deactivate", post(deactivate_device))
        .route("/check-device", get(check_device))
        .route("/validate", get(validate_key))
        .route("/lookup", get(lookup_by_email))
        // Post-checkout page polls this until the webhook has landed
        .route("/success", get(find_by_session));

    if let Some(layer) = rate_limit::standard_layer(rate_limit.standard_rpm) {
        license_routes = license_routes.layer(layer);
    }

    let mut info_routes = Router::new()
        .route("/health", get(health))
        .route("/", get(service_index))
        .fallback(service_index);

    if let Some(layer) = rate_limit::relaxed_layer(rate_limit.relaxed_rpm) {
        info_routes = info_routes.layer(layer);
    }

    license_routes.merge(info_routes)
}
