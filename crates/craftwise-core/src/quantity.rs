//! Validation of caller-supplied quantities.

use serde_json::{Number, Value};

use crate::error::{CraftError, Result};

/// Accept a JSON number as a non-negative integer quantity.
///
/// Integral floats such as `3.0` are accepted; negative values, fractions and
/// non-finite values are rejected with [`CraftError::InvalidQuantity`].
pub fn parse_quantity(value: &Number) -> Result<u64> {
    if let Some(q) = value.as_u64() {
        return Ok(q);
    }
    if let Some(q) = value.as_i64() {
        return Err(CraftError::invalid_quantity(format!(
            "quantity must not be negative, got {q}"
        )));
    }
    match value.as_f64() {
        Some(f) if !f.is_finite() || f.fract() != 0.0 => Err(CraftError::invalid_quantity(
            format!("quantity must be an integer, got {f}"),
        )),
        Some(f) if f < 0.0 => Err(CraftError::invalid_quantity(format!(
            "quantity must not be negative, got {f}"
        ))),
        Some(f) if f > u64::MAX as f64 => Err(CraftError::invalid_quantity(format!(
            "quantity {f} is out of range"
        ))),
        Some(f) => Ok(f as u64),
        None => Err(CraftError::invalid_quantity("quantity is not a number")),
    }
}

/// Like [`parse_quantity`], for a raw JSON value from a request body.
pub fn parse_quantity_value(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => parse_quantity(n),
        Value::Null => Err(CraftError::invalid_quantity("quantity is required")),
        other => Err(CraftError::invalid_quantity(format!(
            "quantity must be a number, got {other}"
        ))),
    }
}

/// Like [`parse_quantity`], for a raw query string parameter.
pub fn parse_quantity_param(raw: &str) -> Result<u64> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Number(n)) => parse_quantity(&n),
        _ => Err(CraftError::invalid_quantity(format!(
            "quantity must be a number, got {raw:?}"
        ))),
    }
}

/// Accept an optional depth bound from a request body; `null` is unbounded.
pub fn parse_depth_value(value: &Value) -> Result<Option<u32>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|d| u32::try_from(d).ok())
            .map(Some)
            .ok_or_else(|| invalid_depth(n)),
        other => Err(invalid_depth(other)),
    }
}

/// Depth bound from a raw query string parameter.
pub fn parse_depth_param(raw: &str) -> Result<u32> {
    raw.trim().parse().map_err(|_| invalid_depth(raw))
}

fn invalid_depth(got: impl std::fmt::Display) -> CraftError {
    CraftError::InvalidRequest(format!(
        "maxDepth must be a non-negative integer or null, got {got}"
    ))
}
