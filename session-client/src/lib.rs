//! QRPass Session Client
//!
//! Client-side session manager for applications talking to the QRPass API:
//! CSRF token caching, bearer-token attachment, and automatic single-shot
//! refresh of expired access tokens.

pub mod client;
pub mod error;

pub use client::{AccountInfo, ClientConfig, SessionClient, SessionInfo, SessionTokens};
pub use error::{ClientError, ClientResult};
