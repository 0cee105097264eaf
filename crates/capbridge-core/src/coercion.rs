//! Per-property value coercion.
//!
//! Devices report JSON of whatever shape their firmware produces; the graph
//! declares what the value should look like. This module is the single place
//! where raw wire values are reconciled with a property's declared format,
//! correction expression and numeric domain. None of these operations raise:
//! a malformed report degrades to a defined fallback and a debug log, never
//! to an error surfaced to the caller.
//!
//! The read side chains three steps:
//!
//! ```text
//! raw JSON ──format_value──► SpecValue ──evaluate_expression──► SpecValue ──quantize──► SpecValue
//! ```
//!
//! For expression-free properties the chain is idempotent: feeding a coerced
//! value back through produces the same value.

use serde_json::Value as JsonValue;

use crate::expr;
use crate::node::{SpecFormat, SpecProperty};
use crate::value::SpecValue;

impl SpecProperty {
    /// Coerce a raw wire value into the property's declared format.
    ///
    /// Booleans use an explicit truthy set (JSON `true`, the number 1, the
    /// strings `"True"`, `"true"` and `"1"`); everything else is false.
    /// Integers truncate toward zero, so `23.7` formats to `23`. Strings
    /// that fail to parse as numbers fall back to zero.
    pub fn format_value(&self, raw: &JsonValue) -> SpecValue {
        match self.format {
            SpecFormat::Bool => SpecValue::Bool(json_truthy(raw)),
            SpecFormat::Integer => SpecValue::Int(json_to_f64(raw, &self.urn) as i64),
            SpecFormat::Float => SpecValue::Float(json_to_f64(raw, &self.urn)),
            SpecFormat::String => match raw {
                JsonValue::String(s) => SpecValue::Str(s.clone()),
                other => SpecValue::Str(other.to_string()),
            },
        }
    }

    /// Apply the property's correction expression, if any.
    ///
    /// Non-numeric values and properties without an expression pass through
    /// unchanged. An expression failure is logged and swallowed; the input
    /// value is returned as reported.
    pub fn evaluate_expression(&self, value: SpecValue) -> SpecValue {
        let Some(source) = self.expr.as_deref() else {
            return value;
        };
        let Some(input) = value.as_f64() else {
            return value;
        };
        match expr::evaluate(source, input) {
            Ok(result) => {
                if matches!(value, SpecValue::Int(_)) && result.fract() == 0.0 {
                    SpecValue::Int(result as i64)
                } else {
                    SpecValue::Float(result)
                }
            }
            Err(error) => {
                tracing::debug!(
                    urn = %self.urn,
                    expr = source,
                    %error,
                    "expression failed, keeping reported value"
                );
                value
            }
        }
    }

    /// Snap a numeric value onto the property's declared domain.
    ///
    /// Float-typed values round to the stored decimal precision and are left
    /// untouched when the precision is zero. Integer-typed values with a
    /// range snap to the nearest multiple of the range step, which can yield
    /// a fractional result for fractional steps: a target of `23.3` against
    /// step `0.5` becomes `23.5`. Integer-typed values without a range round
    /// to the nearest whole number. Booleans and strings pass through.
    pub fn quantize(&self, value: SpecValue) -> SpecValue {
        let Some(v) = value.as_f64() else {
            return value;
        };

        match self.format {
            SpecFormat::Float => {
                if self.precision > 0 {
                    SpecValue::Float(round_to(v, self.precision))
                } else {
                    SpecValue::Float(v)
                }
            }
            SpecFormat::Integer => match &self.value_range {
                Some(range) if range.step > 0.0 => {
                    let snapped =
                        round_to((v / range.step).round() * range.step, range.precision);
                    if snapped.fract() == 0.0 {
                        SpecValue::Int(snapped as i64)
                    } else {
                        SpecValue::Float(snapped)
                    }
                }
                _ => SpecValue::Int(v.round() as i64),
            },
            _ => value,
        }
    }

    /// Full read-side chain: format, expression, quantize.
    pub fn coerce_read(&self, raw: &JsonValue) -> SpecValue {
        self.quantize(self.evaluate_expression(self.format_value(raw)))
    }

    /// Human description for an internal value, via the value list.
    pub fn describe_value(&self, value: &SpecValue) -> Option<&str> {
        self.value_list.as_ref()?.description_of(value)
    }

    /// Internal value for a human description, via the value list.
    pub fn resolve_description(&self, description: &str) -> Option<SpecValue> {
        self.value_list.as_ref()?.value_of(description)
    }
}

fn json_truthy(raw: &JsonValue) -> bool {
    match raw {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64() == Some(1.0),
        JsonValue::String(s) => matches!(s.as_str(), "True" | "true" | "1"),
        _ => false,
    }
}

fn json_to_f64(raw: &JsonValue, urn: &str) -> f64 {
    match raw {
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
        JsonValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsonValue::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            tracing::debug!(%urn, raw = %s, "non-numeric report for numeric property");
            0.0
        }),
        other => {
            tracing::debug!(%urn, raw = %other, "non-numeric report for numeric property");
            0.0
        }
    }
}

fn round_to(v: f64, precision: u8) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (v * factor).round() / factor
}
