//! Helpers shared by the request DTOs: custom field rules and conversion
//! of `validator` output into `FieldError`s.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

use crate::util::error::{FieldError, ServiceError};
use crate::util::sanitize::sanitize_value;

lazy_static! {
    static ref PHONE_CHARS: Regex = Regex::new(r"^\+?[0-9\s\-().]+$").unwrap();
    static ref LETTERS_AND_SPACES: Regex = Regex::new(r"^[A-Za-z\s]+$").unwrap();
}

/// Optional leading `+`, digits separated by spaces, dashes, dots or
/// parentheses, 7 to 15 digits in total.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    PHONE_CHARS.is_match(phone) && (7..=15).contains(&digits)
}

pub fn is_letters_and_spaces(value: &str) -> bool {
    LETTERS_AND_SPACES.is_match(value)
}

pub fn add_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    errors.add(field, error);
}

/// snake_case -> camelCase. Already camelCased names pass through.
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten into one error per field (first message wins), ordered by
/// `field_order` so responses are stable.
pub fn to_field_errors(errors: &ValidationErrors, field_order: &[&str]) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                FieldError::new(to_camel_case(&field.to_string()), message)
            })
        })
        .collect();
    out.sort_by_key(|e| field_order.iter().position(|f| *f == e.field).unwrap_or(usize::MAX));
    out
}

/// Strip markup from every string in the body, then bind it to a DTO.
pub fn parse_sanitized<T: DeserializeOwned>(mut body: Value) -> Result<T, ServiceError> {
    sanitize_value(&mut body);
    serde_json::from_value(body).map_err(|e| {
        ServiceError::Validation(vec![FieldError::new("body", format!("Invalid request body: {}", e))])
    })
}

/// Treat blank optional inputs as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
