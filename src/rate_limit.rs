//! Per-IP rate limiting for public endpoints.
//!
//! Tiers:
//! - Standard: /activate, /deactivate, /validate, /check-device, /lookup, /success
//! - Relaxed: /health and the service index
//!
//! The webhook route is not limited; the payment provider decides its retry rate.
//!
//! Configure via environment variables (0 disables the tier):
//! - RATE_LIMIT_STANDARD_RPM (default: 60)
//! - RATE_LIMIT_RELAXED_RPM (default: 120)
//!
//! Keys are peer IPs, so the server must be run with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Creates a rate limiter layer with the specified requests per minute.
/// Returns `None` when the limit is 0 (disabled).
fn create_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    if requests_per_minute == 0 {
        return None;
    }

    // Replenish one token per (60 / rpm) seconds, at least every millisecond
    let period_ms = (60_000 / requests_per_minute as u64).max(1);
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_millis(period_ms))
        .burst_size(requests_per_minute)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(config)))
}

/// Layer for the license endpoints.
pub fn standard_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    create_layer(requests_per_minute)
}

/// Layer for lightweight endpoints like health checks.
pub fn relaxed_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    create_layer(requests_per_minute)
}
