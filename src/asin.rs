//! ASIN shape validation, applied before any network or database access.

use crate::error::ListingError;

/// Returns `true` iff `token` is a well-formed ASIN: exactly 10 characters
/// drawn from A-Z and 0-9. The input is not normalized; upper-casing is the
/// caller's responsibility.
pub fn is_valid_asin(token: &str) -> bool {
    token.len() == 10
        && token
            .bytes()
            .all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit())
}

/// Gate used by every entry point that takes an identifier.
///
/// # Errors
///
/// Returns [`ListingError::InvalidAsin`] when the token fails shape validation.
pub fn require_valid(token: &str) -> Result<(), ListingError> {
    if is_valid_asin(token) {
        Ok(())
    } else {
        Err(ListingError::InvalidAsin(token.to_string()))
    }
}
