//! Rate limiting middleware using token bucket algorithm.

use anyhow::anyhow;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type RateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates the per-IP rate limiter applied to the API.
///
/// # Limits
///
/// - **Burst**: `burst` requests
/// - **Rate**: one request replenished every `replenish_secs` seconds
///
/// The defaults (100 burst, 36 s) allow 100 requests per hour. Requests
/// exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Rate limits are applied per client IP address extracted from the
/// socket peer address, so the service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Errors
///
/// Returns an error if either value is zero.
pub fn layer(burst: u32, replenish_secs: u64) -> anyhow::Result<RateLimitLayer> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .ok_or_else(|| {
            anyhow!("Invalid rate limit: burst={burst}, replenish_secs={replenish_secs}")
        })?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)))
}
