//! Attendance check-in handler
//!
//! The protected mutation route of the subsystem: a scanned QR session code
//! is turned into a check-in record for the authenticated subject. Reaching
//! this handler means the request already passed origin screening, CSRF
//! verification, sanitization, and bearer-token validation.

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::validation::{FieldValidator, RequestValidation, Rule};
use axum::Json;
use serde::{Deserialize, Serialize};

/// QR scan check-in request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Session code embedded in the scanned QR code
    pub session_code: String,
}

impl RequestValidation for ScanRequest {
    fn validate(&self) -> Result<(), ApiError> {
        FieldValidator::new()
            .field(
                "session_code",
                Some(&self.session_code),
                &[Rule::Required, Rule::MinLen(6)],
            )
            .finish()
    }
}

/// Check-in response
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub session_code: String,
    pub subject_id: String,
    pub checked_in_at: String,
    /// Device fingerprint recorded for the audit trail
    pub device_fingerprint: String,
}

/// Record a check-in for the authenticated subject
pub async fn scan(
    auth: AuthContext,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ApiResponse<CheckInResponse>>, ApiError> {
    request.validate()?;

    tracing::info!(
        subject = %auth.subject_id,
        session = %request.session_code,
        fingerprint = %auth.request.device_fingerprint,
        "Attendance check-in"
    );

    Ok(Json(api_success(CheckInResponse {
        session_code: request.session_code,
        subject_id: auth.subject_id,
        checked_in_at: chrono::Utc::now().to_rfc3339(),
        device_fingerprint: auth.request.device_fingerprint,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_request_requires_code() {
        let request = ScanRequest {
            session_code: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_scan_request_minimum_length() {
        let request = ScanRequest {
            session_code: "abc".to_string(),
        };
        assert!(request.validate().is_err());

        let request = ScanRequest {
            session_code: "ABC123XYZ".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
