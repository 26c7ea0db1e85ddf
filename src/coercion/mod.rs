//! # Type Coercion & Validation
//!
//! Converts raw input values into a column's declared type. Coercion is
//! total for attacker-controlled input: every malformed value becomes a
//! typed error, never a panic.
//!
//! Absence is handled before any type check: empty, blank, and null inputs
//! coerce to `null` unconditionally. Requiredness is the pipeline's concern,
//! not coercion's.

use serde_json::Value;

use crate::model::TypeId;
use crate::registry::CapabilityRegistry;

/// Coerces a raw input value to the column's declared type.
///
/// Returns the typed value, or a human-readable reason usable directly in a
/// `FieldError`.
pub fn coerce(
    raw: &Value,
    type_id: &TypeId,
    registry: &CapabilityRegistry,
) -> Result<Value, String> {
    // Absence short-circuits: no type check is applied to nothing.
    let trimmed = match raw {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(Value::Null);
            }
            t.to_string()
        }
        other => stringify(other),
    };

    // The registry must resolve the type before any value is accepted; an
    // unknown identifier (e.g. a deactivated module's tag) fails here.
    let handler = registry
        .resolve(type_id)
        .map_err(|_| format!("unknown column type '{}'", type_id))?;

    match type_id.as_str() {
        "number" | "float" | "currency" | "percentage" => coerce_number(&trimmed),
        "rating" => {
            handler.validate(&trimmed)?;
            coerce_number(&trimmed)
        }
        "integer" => coerce_integer(&trimmed),
        "boolean" => coerce_boolean(&trimmed),
        "date" | "time" | "datetime" => {
            handler.validate(&trimmed)?;
            Ok(Value::String(trimmed))
        }
        "country" => {
            handler.validate(&trimmed)?;
            Ok(Value::String(trimmed.to_ascii_uppercase()))
        }
        _ => {
            handler.validate(&trimmed)?;
            Ok(Value::String(trimmed))
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn coerce_number(raw: &str) -> Result<Value, String> {
    let parsed: f64 = raw.parse().map_err(|_| format!("'{}' is not a number", raw))?;
    if !parsed.is_finite() {
        return Err(format!("'{}' is not a finite number", raw));
    }
    serde_json::Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| format!("'{}' is not a representable number", raw))
}

fn coerce_integer(raw: &str) -> Result<Value, String> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::from(n));
    }
    let parsed: f64 = raw.parse().map_err(|_| format!("'{}' is not a number", raw))?;
    if !parsed.is_finite() || parsed.fract() != 0.0 {
        return Err(format!("'{}' is not a whole number", raw));
    }
    // An `as` cast saturates; magnitudes beyond i64 must reject instead.
    if parsed < i64::MIN as f64 || parsed >= i64::MAX as f64 {
        return Err(format!("'{}' is out of range for a whole number", raw));
    }
    Ok(Value::from(parsed as i64))
}

fn coerce_boolean(raw: &str) -> Result<Value, String> {
    let lowered = raw.to_lowercase();
    if crate::registry::TRUTHY.contains(&lowered.as_str()) {
        Ok(Value::Bool(true))
    } else if crate::registry::FALSY.contains(&lowered.as_str()) {
        Ok(Value::Bool(false))
    } else {
        Err(format!("'{}' is not a boolean", raw))
    }
}
