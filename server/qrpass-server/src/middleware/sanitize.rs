//! Request screening and sanitization
//!
//! Three layers run before any handler sees a request:
//! - origin screening against the configured allowlist (403)
//! - suspicious-input pattern matching on the query string (403)
//! - body size enforcement (413) and in-place sanitization of JSON string
//!   fields (script blocks, inline event handlers, javascript: URIs)
//!
//! Pattern matching is a best-effort secondary defense. It is not a
//! substitute for parameterized queries or output escaping in the data
//! layer.

use crate::error::ApiError;
use crate::middleware::request_context::{self, RequestContext};
use crate::server::QrPassServer;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

#[allow(clippy::unwrap_used)]
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

#[allow(clippy::unwrap_used)]
static EVENT_HANDLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bon\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap());

#[allow(clippy::unwrap_used)]
static JS_URI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript\s*:").unwrap());

#[allow(clippy::unwrap_used)]
static SQLI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)('\s*(or|and)\b.*=)|(\bunion\s+select\b)|(--)|(;\s*(drop|delete|insert|update)\b)")
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static TRAVERSAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\./|\.\.\\").unwrap());

/// Strip script-like content from a string
///
/// Runs to a fixed point so that fragments revealed by one removal pass
/// (for example `<scr<script>ipt>`) cannot survive, which also makes the
/// function idempotent.
pub fn sanitize_str(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut next = SCRIPT_RE.replace_all(&current, "").into_owned();
        next = EVENT_HANDLER_RE.replace_all(&next, "").into_owned();
        next = JS_URI_RE.replace_all(&next, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Recursively sanitize every string leaf of a JSON value
///
/// Non-string leaves pass through unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Best-effort SQLi/path-traversal detection
pub fn is_suspicious(input: &str) -> bool {
    SQLI_RE.is_match(input) || TRAVERSAL_RE.is_match(input)
}

/// Screening middleware: origin, query string, body size, sanitization
pub async fn screening_middleware(
    State(server): State<QrPassServer>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    // Origin allowlist from server config
    let remote_addr = request_context::client_addr(&parts.extensions, &parts.headers);
    let ctx = RequestContext::from_headers(
        &parts.headers,
        remote_addr,
        &server.config.allowed_origins,
    );
    if !ctx.origin_allowed {
        return Err(ApiError::OriginNotAllowed(
            "Request origin is not allowed".to_string(),
        ));
    }

    // Query string screening
    if let Some(query) = parts.uri.query() {
        if is_suspicious(query) {
            tracing::warn!(request_id = %ctx.request_id, "Suspicious query string rejected");
            return Err(ApiError::SuspiciousInput(
                "Request contains disallowed patterns".to_string(),
            ));
        }
    }

    // Body size enforcement; also catches requests without Content-Length
    let max = server.config.max_body_bytes;
    let bytes = to_bytes(body, max).await.map_err(|_| {
        ApiError::PayloadTooLarge(format!("Request body exceeds {max} bytes"))
    })?;

    // Sanitize JSON string fields in place
    let is_json = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    let body = if is_json && !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                let cleaned = sanitize_value(value);
                let bytes = serde_json::to_vec(&cleaned)
                    .map_err(|_| ApiError::internal("Failed to re-encode request body"))?;
                // Content-Length no longer matches the original body
                parts.headers.remove(header::CONTENT_LENGTH);
                Body::from(bytes)
            }
            // Malformed JSON falls through to the handler's own rejection
            Err(_) => Body::from(bytes),
        }
    } else {
        Body::from(bytes)
    };

    // Hand the context to downstream extractors
    parts.extensions.insert(ctx);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_script_blocks_removed() {
        let input = "hello <script>alert('xss')</script> world";
        assert_eq!(sanitize_str(input), "hello  world");
    }

    #[test]
    fn test_script_with_attributes_removed() {
        let input = r#"<script type="text/javascript" src="evil.js">x</script>ok"#;
        assert_eq!(sanitize_str(input), "ok");
    }

    #[test]
    fn test_event_handlers_removed() {
        let input = r#"<img src="x" onerror="alert(1)">"#;
        let cleaned = sanitize_str(input);
        assert!(!cleaned.to_lowercase().contains("onerror"));
    }

    #[test]
    fn test_javascript_uri_removed() {
        let input = "<a href=\"javascript:alert(1)\">click</a>";
        let cleaned = sanitize_str(input);
        assert!(!cleaned.to_lowercase().contains("javascript:"));
    }

    #[test]
    fn test_nested_script_does_not_survive() {
        let input = "<scr<script>x</script>ipt>alert(1)</scr</script>ipt>";
        let cleaned = sanitize_str(input);
        assert!(!cleaned.to_lowercase().contains("<script"));
        // fixed point reached
        assert_eq!(sanitize_str(&cleaned), cleaned);
    }

    #[test]
    fn test_clean_text_untouched() {
        let input = "On Monday the lecture is online."; // "On " must not trip on\w+=
        assert_eq!(sanitize_str(input), input);
    }

    #[test]
    fn test_sanitize_value_recurses() {
        let value = json!({
            "name": "<script>x</script>Jane",
            "tags": ["ok", "javascript:bad"],
            "nested": { "note": "<b onclick=\"x()\">hi</b>" },
            "count": 7,
            "active": true,
        });
        let cleaned = sanitize_value(value);
        assert_eq!(cleaned["name"], "Jane");
        assert_eq!(cleaned["tags"][1], "bad");
        assert!(!cleaned["nested"]["note"]
            .as_str()
            .unwrap()
            .contains("onclick"));
        assert_eq!(cleaned["count"], 7);
        assert_eq!(cleaned["active"], true);
    }

    #[test]
    fn test_suspicious_patterns() {
        assert!(is_suspicious("id=1' OR '1'='1"));
        assert!(is_suspicious("q=x UNION SELECT password FROM users"));
        assert!(is_suspicious("file=../../etc/passwd"));
        assert!(is_suspicious("note=hello -- drop"));
        assert!(!is_suspicious("course=CS101&unit=intro"));
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in ".{0,256}") {
            let once = sanitize_str(&input);
            let twice = sanitize_str(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_sanitized_output_has_no_script_tag(input in ".{0,256}") {
            let cleaned = sanitize_str(&input).to_lowercase();
            prop_assert!(!SCRIPT_RE.is_match(&cleaned));
            prop_assert!(!JS_URI_RE.is_match(&cleaned));
        }
    }
}
