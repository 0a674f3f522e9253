//! Token issuance and validation module for QRPass Engine
//!
//! This module provides the token lifecycle for the attendance platform:
//! - Short-lived JWT access tokens for authorizing requests
//! - Long-lived refresh tokens used solely to mint new access tokens
//! - Structural and cryptographic validation of bearer tokens
//! - Refresh token revocation on logout
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_tokens::{TokenConfig, TokenService, InMemoryRefreshTokenStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRefreshTokenStore::new());
//!     let service = TokenService::new(TokenConfig::default(), store);
//!
//!     let pair = service.issue("student-42", "student").await?;
//!     let claims = service.validate(&pair.access_token)?;
//!     let new_access = service.refresh(&pair.refresh_token).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use claims::*;
pub use config::*;
pub use error::*;
pub use service::*;
pub use store::*;
