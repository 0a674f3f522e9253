use thiserror::Error;

/// Simplified error enum for cross-crate use
#[derive(Error, Debug)]
pub enum QrPassError {
    /// Authentication/token lifecycle errors
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// CSRF protection rejections
    #[error("CSRF error: {0}")]
    CsrfError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed-login lockout conditions
    #[error("Account lockout: {0}")]
    LockoutError(String),

    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Generic error with context
    #[error("Error: {message}")]
    Generic { message: String },

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for QRPass operations
pub type Result<T> = std::result::Result<T, QrPassError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_omits_internals() {
        let err = QrPassError::AuthError("token rejected".to_string());
        assert_eq!(err.to_string(), "Authentication error: token rejected");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: QrPassError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, QrPassError::Other(_)));
    }
}
