//! Field-level input checks shared by every request payload.
//!
//! Each helper records its messages into a [`FieldErrors`] set and returns the
//! normalized value, so a payload can report every failing field in one response.

use crate::error::FieldErrors;
use validator::{ValidateEmail, ValidateUrl};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_URL: &str = "Enter a valid URL.";

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

fn exceeds(value: &str, max: Option<usize>) -> bool {
    max.is_some_and(|max| value.chars().count() > max)
}

/// A required, non-blank string no longer than `max` characters (`None` for unbounded text).
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: Option<usize>,
) -> String {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return String::new();
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        errors.add(field, BLANK);
    } else if exceeds(&value, max) {
        errors.add(field, too_long(max.unwrap_or_default()));
    }
    value
}

/// An optional string; blank input is stored as absent.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: Option<usize>,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    if exceeds(&value, max) {
        errors.add(field, too_long(max.unwrap_or_default()));
    }
    Some(value)
}

pub fn required_email(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    let value = required_text(errors, field, value, Some(254));
    if !value.is_empty() && !value.validate_email() {
        errors.add(field, INVALID_EMAIL);
    }
    value
}

pub fn optional_url(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    let value = optional_text(errors, field, value, Some(max))?;
    if !value.validate_url() {
        errors.add(field, INVALID_URL);
    }
    Some(value)
}
