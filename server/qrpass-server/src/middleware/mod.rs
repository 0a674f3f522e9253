//! Middleware modules for request processing

pub mod auth_context;
pub mod csrf;
pub mod rate_limit;
pub mod request_context;
pub mod sanitize;

// Re-export for convenience
pub use auth_context::AuthContext;
pub use csrf::csrf_middleware;
pub use rate_limit::rate_limit_middleware;
pub use request_context::RequestContext;
pub use sanitize::{is_suspicious, sanitize_str, sanitize_value, screening_middleware};

use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// CORS layer for the API
///
/// Methods and headers stay permissive; the origin reflected back is gated
/// on the same allowlist the screening middleware enforces, so browser
/// clients on allowlisted origins pass preflight and everyone else gets no
/// `Access-Control-Allow-Origin` at all.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed = allowed_origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            allowed.is_empty()
                || origin
                    .to_str()
                    .map(|value| request_context::origin_host_allowed(value, &allowed))
                    .unwrap_or(false)
        }))
        .allow_methods(Any)
        .allow_headers(Any)
}
