//! # Validation Module
//!
//! Pre-flight validation for authentication input.
//!
//! These checks run before any network call so obviously malformed input
//! never reaches the auth service. The auth service remains the authority
//! on whether an identifier is actually registered or a secret accepted.

use crate::error::CoreError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, CoreError>;

/// Maximum identifier length accepted by the auth service.
const MAX_IDENTIFIER_LEN: usize = 254;

/// Minimum secret length.
const MIN_SECRET_LEN: usize = 8;

/// Maximum display name length.
const MAX_DISPLAY_NAME_LEN: usize = 80;

/// Validates an account identifier (an email address).
///
/// ## Rules
/// - Must not be empty
/// - Must contain a single `@` with characters on both sides
/// - Domain part must contain a dot
/// - Must be at most 254 characters
pub fn validate_identifier(identifier: &str) -> ValidationResult<()> {
    let identifier = identifier.trim();

    if identifier.is_empty() {
        return Err(CoreError::Required {
            field: "identifier",
        });
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::TooLong {
            field: "identifier",
            max: MAX_IDENTIFIER_LEN,
        });
    }

    let mut parts = identifier.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(CoreError::InvalidFormat {
            field: "identifier",
            reason: "must be an email address",
        });
    }

    Ok(())
}

/// Validates a secret (password).
pub fn validate_secret(secret: &str) -> ValidationResult<()> {
    if secret.is_empty() {
        return Err(CoreError::Required { field: "secret" });
    }

    if secret.len() < MIN_SECRET_LEN {
        return Err(CoreError::SecretTooShort {
            min: MIN_SECRET_LEN,
        });
    }

    Ok(())
}

/// Validates an optional display name supplied at registration.
pub fn validate_display_name(display_name: Option<&str>) -> ValidationResult<()> {
    if let Some(name) = display_name {
        if name.trim().is_empty() {
            return Err(CoreError::Required {
                field: "display_name",
            });
        }
        if name.len() > MAX_DISPLAY_NAME_LEN {
            return Err(CoreError::TooLong {
                field: "display_name",
                max: MAX_DISPLAY_NAME_LEN,
            });
        }
    }
    Ok(())
}
