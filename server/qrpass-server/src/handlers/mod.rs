//! HTTP request handlers

pub mod attendance;
pub mod auth;
pub mod health;
