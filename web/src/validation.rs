//! Input validation at the HTTP boundary.

use crate::error::AppError;
use epass_core::UserId;
use regex::Regex;
use std::sync::LazyLock;

/// `1BM`, two-digit year, two-letter branch, three-digit roll number.
#[allow(clippy::expect_used)]
static USN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1BM\d{2}[A-Z]{2}\d{3}$").expect("USN pattern is valid"));

/// Whether `usn` is a well-formed university seat number.
#[must_use]
pub fn is_valid_usn(usn: &str) -> bool {
    USN_PATTERN.is_match(usn)
}

/// Accept a well-formed USN as a [`UserId`].
///
/// # Errors
///
/// Returns a 422 [`AppError`] if the USN is malformed.
pub fn parse_usn(usn: &str) -> Result<UserId, AppError> {
    if is_valid_usn(usn) {
        Ok(UserId::new(usn))
    } else {
        Err(AppError::validation(format!("Invalid USN: {usn}")))
    }
}
