//! Declarative request validation
//!
//! Validation collects *every* violation before failing, so the caller can
//! report all problems at once instead of fixing them one by one. Rules are
//! declarative per field: required, email format, minimum length, character
//! class membership, and enum membership.

use crate::error::{ApiError, FieldError};
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Character classes a password-like field can be required to contain
#[derive(Debug, Clone, Copy)]
pub enum CharClass {
    Uppercase,
    Lowercase,
    Digit,
    Special,
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        match self {
            Self::Uppercase => c.is_ascii_uppercase(),
            Self::Lowercase => c.is_ascii_lowercase(),
            Self::Digit => c.is_ascii_digit(),
            Self::Special => !c.is_ascii_alphanumeric() && !c.is_whitespace(),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Uppercase => "an uppercase letter",
            Self::Lowercase => "a lowercase letter",
            Self::Digit => "a digit",
            Self::Special => "a special character",
        }
    }
}

/// One declarative validation rule
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Email,
    MinLen(usize),
    CharClass(CharClass),
    OneOf(&'static [&'static str]),
}

/// Collects violations across fields, then fails once with all of them
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: Vec<FieldError>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply rules to a field value
    ///
    /// `Required` fires on an absent or blank value; every other rule is
    /// skipped when the value is absent, so optional fields validate only
    /// when present.
    pub fn field(mut self, name: &str, value: Option<&str>, rules: &[Rule]) -> Self {
        let present = value.map(|v| !v.trim().is_empty()).unwrap_or(false);

        for rule in rules {
            match rule {
                Rule::Required => {
                    if !present {
                        self.errors
                            .push(FieldError::new(name, format!("{name} is required")));
                    }
                }
                Rule::Email => {
                    if let Some(v) = value {
                        if present && !EMAIL_RE.is_match(v) {
                            self.errors
                                .push(FieldError::new(name, "Invalid email format"));
                        }
                    }
                }
                Rule::MinLen(min) => {
                    if let Some(v) = value {
                        if present && v.len() < *min {
                            self.errors.push(FieldError::new(
                                name,
                                format!("{name} must be at least {min} characters"),
                            ));
                        }
                    }
                }
                Rule::CharClass(class) => {
                    if let Some(v) = value {
                        if present && !v.chars().any(|c| class.matches(c)) {
                            self.errors.push(FieldError::new(
                                name,
                                format!("{name} must contain {}", class.description()),
                            ));
                        }
                    }
                }
                Rule::OneOf(allowed) => {
                    if let Some(v) = value {
                        if present && !allowed.contains(&v) {
                            self.errors.push(FieldError::new(
                                name,
                                format!("{name} must be one of: {}", allowed.join(", ")),
                            ));
                        }
                    }
                }
            }
        }

        self
    }

    /// Fail with all collected violations, or pass
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed(self.errors))
        }
    }
}

/// Trait for validating request payloads
///
/// Implement this for all request types so handlers can validate with one
/// call. Implementations collect every violation before failing.
pub trait RequestValidation {
    fn validate(&self) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_count(result: Result<(), ApiError>) -> usize {
        match result {
            Err(ApiError::ValidationFailed(errors)) => errors.len(),
            Err(_) => panic!("expected ValidationFailed"),
            Ok(()) => 0,
        }
    }

    #[test]
    fn test_two_missing_required_fields_two_errors() {
        let result = FieldValidator::new()
            .field("email", None, &[Rule::Required, Rule::Email])
            .field("password", None, &[Rule::Required, Rule::MinLen(8)])
            .finish();
        assert_eq!(error_count(result), 2);
    }

    #[test]
    fn test_valid_payload_passes() {
        let result = FieldValidator::new()
            .field("email", Some("user@example.com"), &[Rule::Required, Rule::Email])
            .field(
                "password",
                Some("Str0ng!pass"),
                &[
                    Rule::Required,
                    Rule::MinLen(8),
                    Rule::CharClass(CharClass::Uppercase),
                    Rule::CharClass(CharClass::Lowercase),
                    Rule::CharClass(CharClass::Digit),
                    Rule::CharClass(CharClass::Special),
                ],
            )
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_violations_collected_not_fail_fast() {
        let result = FieldValidator::new()
            .field("email", Some("not-an-email"), &[Rule::Required, Rule::Email])
            .field(
                "password",
                Some("short"),
                &[
                    Rule::Required,
                    Rule::MinLen(8),
                    Rule::CharClass(CharClass::Uppercase),
                    Rule::CharClass(CharClass::Digit),
                ],
            )
            .finish();
        // invalid email + too short + no uppercase + no digit
        assert_eq!(error_count(result), 4);
    }

    #[test]
    fn test_optional_field_skipped_when_absent() {
        let result = FieldValidator::new()
            .field("role", None, &[Rule::OneOf(&["student", "lecturer", "admin"])])
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn test_enum_membership() {
        let result = FieldValidator::new()
            .field(
                "role",
                Some("superuser"),
                &[Rule::OneOf(&["student", "lecturer", "admin"])],
            )
            .finish();
        assert_eq!(error_count(result), 1);
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let result = FieldValidator::new()
            .field("email", Some("   "), &[Rule::Required])
            .finish();
        assert_eq!(error_count(result), 1);
    }
}
