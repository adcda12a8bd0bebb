//! Identity and credential field checks.
//!
//! Shared by the server-side request types (as `validator` custom functions)
//! and by the client, which runs the same checks before making any call.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Digits in an Aadhaar number.
pub const AADHAAR_LEN: usize = 12;
/// Digits in a mobile number, without country code.
pub const PHONE_LEN: usize = 10;
/// Digits in a one-time password.
pub const OTP_LEN: usize = 6;
/// Shortest accepted password.
pub const PASSWORD_MIN_LEN: usize = 6;
/// Longest accepted password.
pub const PASSWORD_MAX_LEN: usize = 128;

static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CG[A-Z0-9]{6}$").expect("valid user id regex"));

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `value` is exactly 12 ASCII digits.
#[must_use]
pub fn is_valid_aadhaar(value: &str) -> bool {
    is_digits(value, AADHAAR_LEN)
}

/// Whether `value` is exactly 10 ASCII digits.
#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    is_digits(value, PHONE_LEN)
}

/// Whether `value` is exactly 6 ASCII digits.
#[must_use]
pub fn is_valid_otp(value: &str) -> bool {
    is_digits(value, OTP_LEN)
}

/// Whether `value` satisfies the password length policy.
#[must_use]
pub fn is_valid_password(value: &str) -> bool {
    let len = value.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
}

/// Whether `value` looks like an issued account ID.
#[must_use]
pub fn is_valid_user_id(value: &str) -> bool {
    USER_ID_RE.is_match(value)
}

/// Strip `+91`, spaces and dashes from a phone number as typed.
#[must_use]
pub fn normalize_phone(value: &str) -> String {
    let trimmed = value.trim();
    let without_code = trimmed.strip_prefix("+91").unwrap_or(trimmed);
    without_code
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Mask all but the last four characters.
#[must_use]
pub fn mask_tail(value: &str) -> String {
    let count = value.chars().count();
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < count { 'X' } else { c })
        .collect()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// `validator` hook for Aadhaar numbers.
pub fn validate_aadhaar(value: &str) -> Result<(), ValidationError> {
    if is_valid_aadhaar(value) {
        Ok(())
    } else {
        Err(error("aadhaar", "Aadhaar number must be exactly 12 digits"))
    }
}

/// `validator` hook for phone numbers.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if is_valid_phone(value) {
        Ok(())
    } else {
        Err(error("phone", "Phone number must be exactly 10 digits"))
    }
}

/// `validator` hook for one-time passwords.
pub fn validate_otp(value: &str) -> Result<(), ValidationError> {
    if is_valid_otp(value) {
        Ok(())
    } else {
        Err(error("otp", "OTP must be exactly 6 digits"))
    }
}

/// `validator` hook for passwords.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if is_valid_password(value) {
        Ok(())
    } else {
        Err(error(
            "password",
            "Password must be between 6 and 128 characters",
        ))
    }
}

/// `validator` hook for account IDs.
pub fn validate_user_id(value: &str) -> Result<(), ValidationError> {
    if is_valid_user_id(value) {
        Ok(())
    } else {
        Err(error("user_id", "User ID must look like CG followed by 6 characters"))
    }
}
