//! Error types for the session client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Server unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Rate limited by server")]
    RateLimited {
        /// Seconds until the server accepts requests again, when advertised
        retry_after_seconds: Option<u64>,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Access token expired")]
    TokenExpired,

    #[error("Session terminated, sign in again")]
    SessionTerminated,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Client error: {0}")]
    Internal(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
