//! Double-submit cookie CSRF protection
//!
//! A random per-session token is issued in a script-readable cookie; every
//! state-changing request must echo the same value in a request header. The
//! server compares the two by exact match and rejects on any difference. A
//! missing cookie or a missing header counts as a mismatch, never as "no
//! CSRF needed".

use crate::error::ApiError;
use axum::extract::Request;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use rand::RngCore;

/// Cookie the token is issued in (readable by the frontend)
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Headers accepted on state-changing requests (either works)
pub const CSRF_HEADERS: [&str; 2] = ["X-XSRF-TOKEN", "X-CSRF-TOKEN"];

/// Cookie lifetime: 4 hours
const CSRF_TTL_SECONDS: u64 = 4 * 60 * 60;

/// Generate a fresh CSRF token: 32 random bytes, hex-encoded
pub fn issue_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build the Set-Cookie value for a CSRF token
///
/// Not httpOnly: the frontend must read it back to echo it in the header.
/// The Secure flag is gated on production mode so local development over
/// plain HTTP keeps working.
pub fn cookie_for(token: &str, production: bool) -> String {
    let mut cookie = format!(
        "{CSRF_COOKIE}={token}; Path=/; Max-Age={CSRF_TTL_SECONDS}; SameSite=Strict"
    );
    if production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract a named cookie value from the Cookie header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Extract the CSRF token from whichever accepted header is present
pub fn header_token(headers: &HeaderMap) -> Option<String> {
    CSRF_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    })
}

/// Whether the method is exempt from CSRF verification
fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

/// Verify the double-submit pair for a request
pub fn verify(
    method: &Method,
    cookie: Option<&str>,
    header: Option<&str>,
) -> Result<(), ApiError> {
    if is_safe_method(method) {
        return Ok(());
    }

    match (cookie, header) {
        (Some(cookie), Some(header)) if !cookie.is_empty() && cookie == header => Ok(()),
        (Some(_), Some(_)) => Err(ApiError::csrf("CSRF token mismatch")),
        _ => Err(ApiError::csrf(
            "CSRF token required for state-changing requests",
        )),
    }
}

/// CSRF middleware for state-changing routes
pub async fn csrf_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let cookie = cookie_value(request.headers(), CSRF_COOKIE);
    let header = header_token(request.headers());

    verify(request.method(), cookie.as_deref(), header.as_deref())?;

    Ok(next.run(request).await)
}
