//! QRPass Server - session security layer for the attendance platform API
//!
//! This library provides the HTTP surface of the QRPass security subsystem:
//! token issuance and validation, double-submit CSRF protection, failed-login
//! lockout, request sanitization, and the supporting middleware chain.

pub mod attempts;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod validation;

// Re-export commonly used types
pub use error::*;
pub use server::{QrPassServer, ServerConfig};

use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
///
/// Request flow: trace -> CORS -> rate limit -> CSRF verification ->
/// screening (origin, suspicious input, body size, sanitization) -> route
/// handler. CSRF runs before screening so a cross-site request is rejected
/// before any body is buffered. Bearer-token validation happens per route
/// via the `AuthContext` extractor.
pub fn create_app(server: QrPassServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(
                    &server.config.allowed_origins,
                ))
                .layer(Extension(server.tokens.clone()))
                .layer(from_fn_with_state(
                    server.clone(),
                    middleware::rate_limit_middleware,
                ))
                .layer(from_fn(middleware::csrf_middleware))
                .layer(from_fn_with_state(
                    server.clone(),
                    middleware::screening_middleware,
                )),
        )
        .with_state(server)
}
