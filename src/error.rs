use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// User-facing messages. Clients match on some of these strings, keep them stable.
pub mod msg {
    pub const MISSING_KEY_OR_DEVICE: &str = "Missing key or deviceId";
    pub const INVALID_LICENSE_KEY: &str = "Invalid license key";
    pub const LICENSE_NOT_ACTIVE: &str = "License is not active";
    pub const NO_KEY_PROVIDED: &str = "No key provided";
    pub const PROCESSING: &str = "Processing...";
    pub const INVALID_SIGNATURE: &str = "Invalid webhook signature";
    pub const INVALID_SIGNATURE_FORMAT: &str = "Invalid signature format";
    pub const INVALID_TIMESTAMP_IN_SIGNATURE: &str = "Invalid timestamp in signature";
    pub const MISSING_SIGNATURE: &str = "Missing Stripe-Signature header";
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";

    pub fn device_limit(max: usize) -> String {
        format!(
            "License already activated on {} devices. Deactivate a device or contact support.",
            max
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid license key")]
    InvalidKey,

    #[error("License is not active")]
    LicenseInactive,

    #[error("Device limit reached ({used}/{max})")]
    DeviceLimitExceeded { used: usize, max: usize },

    #[error("Store read error: {0}")]
    StoreRead(StoreError),

    #[error("Store write error: {0}")]
    StoreWrite(StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Expected outcomes of a request, as opposed to failures of the service.
    /// Routes answer these with 200 and the operation's failure body.
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_)
                | AppError::InvalidKey
                | AppError::LicenseInactive
                | AppError::DeviceLimitExceeded { .. }
        )
    }

    /// The message a client sees for this error.
    pub fn client_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InvalidKey => msg::INVALID_LICENSE_KEY.to_string(),
            AppError::LicenseInactive => msg::LICENSE_NOT_ACTIVE.to_string(),
            AppError::DeviceLimitExceeded { max, .. } => msg::device_limit(*max),
            AppError::InvalidBody(_) => "Invalid JSON".to_string(),
            AppError::StoreRead(_)
            | AppError::StoreWrite(_)
            | AppError::Json(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::InvalidKey
            | AppError::LicenseInactive
            | AppError::DeviceLimitExceeded { .. } => StatusCode::OK,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::StoreRead(_)
            | AppError::StoreWrite(_)
            | AppError::Json(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log server-side failures. Expected outcomes are not logged here.
    pub fn log(&self) {
        match self {
            AppError::StoreRead(e) => tracing::error!("Store read error: {}", e),
            AppError::StoreWrite(e) => tracing::error!("Store write error: {}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Json(e) => tracing::error!("JSON error: {}", e),
            AppError::InvalidBody(e) => tracing::debug!("Rejected request body: {}", e),
            _ => {}
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorResponse {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
