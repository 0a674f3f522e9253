//! Common error handling utilities for QRPass Engine
//!
//! This module provides standardized error types and error codes used across
//! all QRPass Engine crates. It ensures consistent error handling and secure
//! error reporting: messages surfaced to clients never carry credentials or
//! token material.
//!
//! # Error Categories
//!
//! - **AuthError**: Authentication and token lifecycle errors
//! - **CsrfError**: Cross-site request forgery rejections
//! - **ValidationError**: Input validation and data format errors
//! - **LockoutError**: Failed-login lockout conditions
//! - **NetworkError**: HTTP and network communication errors
//! - **ConfigError**: Configuration and environment errors
//! - **InternalError**: Infrastructure and system-level errors

pub mod codes;
pub mod types;

pub use codes::*;
pub use types::*;
