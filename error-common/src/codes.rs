// Error codes implementation
// This module contains standardized error codes for QRPass Engine

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
    pub const SUSPICIOUS_INPUT: &str = "VALIDATION_1004";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const TOKEN_INVALID: &str = "AUTH_2003";
    pub const REFRESH_INVALID: &str = "AUTH_2004";
    pub const ACCOUNT_LOCKED: &str = "AUTH_2005";
}

pub mod csrf {
    pub const TOKEN_MISMATCH: &str = "CSRF_3001";
    pub const TOKEN_MISSING: &str = "CSRF_3002";
    pub const ORIGIN_NOT_ALLOWED: &str = "CSRF_3003";
}

pub mod transport {
    pub const RATE_LIMITED: &str = "NET_4001";
    pub const PAYLOAD_TOO_LARGE: &str = "NET_4002";
    pub const UNREACHABLE: &str = "NET_4003";
}
