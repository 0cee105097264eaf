//! Helpers for picking typed fields out of raw document JSON.

use capbridge_core::node::{SpecValueListItem, SpecValueRange};
use capbridge_core::value::SpecValue;
use serde_json::Value;

/// Parse a wire value-range array `[min, max, step]`.
///
/// The step is kept as a `serde_json::Number` so the derived precision comes
/// from its decimal string form, not from float inspection.
pub(crate) fn parse_value_range(raw: &Value) -> Option<SpecValueRange> {
    let arr = raw.as_array()?;
    if arr.len() < 3 {
        return None;
    }
    let min = arr[0].as_f64()?;
    let max = arr[1].as_f64()?;
    let Value::Number(step) = &arr[2] else {
        return None;
    };
    Some(SpecValueRange::from_wire(min, max, step))
}

/// Convert a raw scalar into a [`SpecValue`]; arrays/objects/null have no
/// scalar form and yield `None`.
pub(crate) fn json_to_spec_value(raw: &Value) -> Option<SpecValue> {
    match raw {
        Value::Bool(b) => Some(SpecValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(SpecValue::Int(i))
            } else {
                n.as_f64().map(SpecValue::Float)
            }
        }
        Value::String(s) => Some(SpecValue::Str(s.clone())),
        _ => None,
    }
}

/// Parse a wire value-list array of `{ value, name, description }` entries.
/// Entries without a usable value are dropped; a missing description falls
/// back to the machine name.
pub(crate) fn parse_value_list_items(raw: &Value) -> Vec<SpecValueListItem> {
    let Some(arr) = raw.as_array() else {
        return Vec::new();
    };
    let mut items = Vec::with_capacity(arr.len());
    for entry in arr {
        let Some(value) = entry.get("value").and_then(json_to_spec_value) else {
            tracing::warn!("value-list entry without a scalar value, dropped");
            continue;
        };
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = entry
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&name)
            .to_string();
        items.push(SpecValueListItem {
            value,
            name,
            description,
        });
    }
    items
}
