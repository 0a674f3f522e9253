use crate::handlers::{attendance, auth, health};
use crate::server::QrPassServer;
use axum::routing::{get, post};
use axum::Router;

/// Route path constants
pub mod paths {
    pub mod health {
        pub const HEALTH: &str = "/api/v1/health";
        pub const VERSION: &str = "/api/v1/version";
    }

    pub mod auth {
        pub const LOGIN: &str = "/api/v1/auth/login";
        pub const LOGOUT: &str = "/api/v1/auth/logout";
        pub const REFRESH: &str = "/api/v1/auth/refresh";
        pub const CSRF: &str = "/api/v1/auth/csrf";
        pub const ME: &str = "/api/v1/auth/me";
    }

    pub mod attendance {
        pub const SCAN: &str = "/api/v1/attendance/scan";
    }
}

/// Create health check routes
pub fn health_routes() -> Router<QrPassServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Create authentication routes
pub fn auth_routes() -> Router<QrPassServer> {
    Router::new()
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::LOGOUT, post(auth::logout))
        .route(paths::auth::REFRESH, post(auth::refresh))
        .route(paths::auth::CSRF, get(auth::csrf_token))
        .route(paths::auth::ME, get(auth::me))
}

/// Create attendance routes
pub fn attendance_routes() -> Router<QrPassServer> {
    Router::new().route(paths::attendance::SCAN, post(attendance::scan))
}

/// Combine all route groups
pub fn create_routes() -> Router<QrPassServer> {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(attendance_routes())
}
