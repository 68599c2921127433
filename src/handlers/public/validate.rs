use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;

use crate::error::{AppError, msg};
use crate::extractors::Query;
use crate::state::AppState;

use super::{flagged_failure, ok};

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub key: Option<String>,
}

/// GET /validate?key=...
pub async fn validate_key(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Response {
    let Some(key) = query.key.as_deref().filter(|k| !k.is_empty()) else {
        return flagged_failure("valid", AppError::BadRequest(msg::NO_KEY_PROVIDED.into()));
    };

    match state.service.validate_key(key) {
        Ok(validation) => ok(validation),
        Err(e) => flagged_failure("valid", e),
    }
}
