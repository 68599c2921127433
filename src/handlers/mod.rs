pub mod public;
pub mod webhooks;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::AppState;

pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origin = match allowed_origins {
        None => AllowOrigin::any(),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|_| tracing::warn!("Ignoring invalid CORS origin: {}", o))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("stripe-signature"),
        ])
}

/// The full HTTP surface: public license routes, the payment webhook,
/// CORS and request tracing.
pub fn app(state: AppState, config: &Config) -> Router {
    Router::new()
        .merge(public::router(config.rate_limit))
        .merge(webhooks::router())
        .layer(cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
