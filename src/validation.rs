//! Field-level checks for submitted JSON bodies.
//!
//! Each check records its message in a [`FieldErrors`] and returns `None` on
//! failure so a whole body can be checked before reporting.

use bigdecimal::BigDecimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::errors::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_A_NUMBER: &str = "A valid number is required.";

/// Name of a JSON value's type as reported in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Requires the request body to be a JSON object.
pub fn expect_object(body: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    body.as_object().ok_or_else(|| {
        FieldErrors::single(
            FieldErrors::NON_FIELD,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                type_name(body)
            ),
        )
    })
}

/// Looks a field up, treating absence as required unless `partial` is set.
///
/// Returns `None` both for "absent in a partial update" and for "required
/// but missing" (the latter records an error).
pub fn lookup<'a>(
    data: &'a Map<String, Value>,
    field: &str,
    partial: bool,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match data.get(field) {
        Some(value) => Some(value),
        None => {
            if !partial {
                errors.add(field, REQUIRED);
            }
            None
        }
    }
}

/// A non-blank string of at most `max_chars` characters, whitespace-trimmed.
/// Numbers are accepted and rendered as text.
pub fn text(field: &str, value: &Value, max_chars: usize, errors: &mut FieldErrors) -> Option<String> {
    let raw = match value {
        Value::Null => {
            errors.add(field, NOT_NULL);
            return None;
        }
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(field, NOT_A_STRING);
            return None;
        }
    };

    if raw.is_empty() {
        errors.add(field, NOT_BLANK);
        return None;
    }
    if raw.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", max_chars),
        );
        return None;
    }
    Some(raw)
}

/// A fixed-point decimal with at most `max_digits` digits, `decimal_places`
/// of them after the point. The result is scaled to `decimal_places`.
pub fn decimal(
    field: &str,
    value: &Value,
    max_digits: u64,
    decimal_places: u64,
    errors: &mut FieldErrors,
) -> Option<BigDecimal> {
    let raw = match value {
        Value::Null => {
            errors.add(field, NOT_NULL);
            return None;
        }
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(field, NOT_A_NUMBER);
            return None;
        }
    };

    let Ok(parsed) = BigDecimal::from_str(&raw) else {
        errors.add(field, NOT_A_NUMBER);
        return None;
    };

    match check_precision(&parsed, max_digits, decimal_places) {
        Ok(()) => Some(parsed.with_scale(decimal_places as i64)),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Digit-count limits of a decimal: total digits, digits after the point,
/// and digits before it. Only the first violated limit is reported.
pub fn check_precision(value: &BigDecimal, max_digits: u64, decimal_places: u64) -> Result<(), String> {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let digit_count = mantissa.magnitude().to_string().len() as u64;
    let exponent = -scale;

    let (total, whole, decimals) = if exponent >= 0 {
        let total = digit_count + exponent as u64;
        (total, total, 0)
    } else {
        let places = exponent.unsigned_abs();
        if digit_count > places {
            (digit_count, digit_count - places, places)
        } else {
            (places, 0, places)
        }
    };

    if total > max_digits {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            max_digits
        ));
    }
    if decimals > decimal_places {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            decimal_places
        ));
    }
    let max_whole = max_digits - decimal_places;
    if whole > max_whole {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_whole
        ));
    }
    Ok(())
}
