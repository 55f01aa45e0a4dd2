//! Credential input validation.
//!
//! Runs in the request-parsing layer, before credentials reach the
//! authentication core. Only shape is checked here: no email format rules.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Validation error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty (after trimming, for emails).
    #[error("{field} must not be empty")]
    Empty {
        /// Field name.
        field: &'static str,
    },

    /// Input exceeds maximum allowed length.
    #[error("{field} exceeds maximum length ({max} bytes, got {actual})")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual input length.
        actual: usize,
    },

    /// Disallowed characters in input.
    #[error("{field} contains disallowed characters")]
    DisallowedChars {
        /// Field name.
        field: &'static str,
    },
}

/// Size limits per input type.
pub mod limits {
    /// Maximum email length (RFC 5321 path limit).
    pub const MAX_EMAIL_LENGTH: usize = 254;

    /// Maximum password length. Bounds hashing cost per request.
    pub const MAX_PASSWORD_LENGTH: usize = 1024;
}

/// Normalize an email for lookup.
///
/// Trims surrounding whitespace, applies NFKC and lowercases. Control
/// characters are rejected rather than stripped so two different inputs never
/// collapse onto the same account.
///
/// # Errors
///
/// Returns `ValidationError` if the email is empty, too long, or contains
/// control characters.
pub fn normalize_email(input: &str) -> Result<String, ValidationError> {
    const FIELD: &str = "email";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: FIELD });
    }

    // Bound the work before normalizing; NFKC output is checked again below
    if trimmed.len() > limits::MAX_EMAIL_LENGTH * 4 {
        return Err(ValidationError::TooLong {
            field: FIELD,
            max: limits::MAX_EMAIL_LENGTH,
            actual: trimmed.len(),
        });
    }

    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::DisallowedChars { field: FIELD });
    }

    let normalized = trimmed.nfkc().collect::<String>().to_lowercase();
    if normalized.len() > limits::MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: FIELD,
            max: limits::MAX_EMAIL_LENGTH,
            actual: normalized.len(),
        });
    }

    Ok(normalized)
}

/// Check a plaintext password. The password itself is never rewritten.
///
/// # Errors
///
/// Returns `ValidationError` if the password is empty, too long, or contains
/// a NUL byte.
pub fn check_password(input: &str) -> Result<(), ValidationError> {
    const FIELD: &str = "password";

    if input.is_empty() {
        return Err(ValidationError::Empty { field: FIELD });
    }

    if input.len() > limits::MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: FIELD,
            max: limits::MAX_PASSWORD_LENGTH,
            actual: input.len(),
        });
    }

    if input.contains('\0') {
        return Err(ValidationError::DisallowedChars { field: FIELD });
    }

    Ok(())
}
