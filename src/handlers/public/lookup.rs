//! Lookups used by the purchase and recovery pages.

use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;

use crate::extractors::Query;
use crate::state::AppState;

use super::{flagged_failure, ok};

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// GET /lookup?email=...
pub async fn lookup_by_email(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let email = query.email.as_deref().unwrap_or_default();

    match state.service.lookup_by_email(email) {
        Ok(lookup) => ok(lookup),
        Err(e) => flagged_failure("found", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// GET /success?session_id=...
///
/// Answers `{success:false, message:"Processing..."}` until the payment
/// webhook has created the license; the page keeps polling.
pub async fn find_by_session(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Response {
    let session_id = query.session_id.as_deref().unwrap_or_default();

    match state.service.find_by_session(session_id) {
        Ok(lookup) => ok(lookup),
        Err(e) => flagged_failure("success", e),
    }
}
