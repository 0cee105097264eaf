//! Property patch rules.
//!
//! The modify table corrects fields the vendor document gets wrong: a bogus
//! unit, a format that does not match the firmware, a missing correction
//! expression. Patches are keyed by exact identifier, then by
//! `"<siid>.<piid>"`, and are applied after default parsing so overlay
//! values always win:
//!
//! ```json
//! {
//!   "urn:cap-spec-v2:device:thermostat:0000A031:acme-t1:1": {
//!     "3.1": { "unit": "celsius", "expr": "value / 10" },
//!     "3.2": { "access": ["read", "notify"] }
//!   }
//! }
//! ```

use capbridge_core::node::{SpecAccess, SpecFormat, SpecProperty, SpecValueList};
use serde_json::Value;

use super::resolve_alias;
use crate::wire;

/// Identifier-keyed patch table.
#[derive(Debug, Default)]
pub struct SpecModify {
    rules: serde_json::Map<String, Value>,
}

impl SpecModify {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            rules: serde_json::from_str(text)?,
        })
    }

    /// Resolve the patch set for an exact identifier, following aliases.
    pub fn select(&self, identifier: &str) -> ModifyView {
        let patches = resolve_alias(&self.rules, identifier)
            .and_then(Value::as_object)
            .cloned();
        ModifyView { patches }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Patches for one selected identifier.
#[derive(Debug, Default)]
pub struct ModifyView {
    patches: Option<serde_json::Map<String, Value>>,
}

impl ModifyView {
    pub fn patch_for(&self, siid: u32, piid: u32) -> Option<&Value> {
        self.patches
            .as_ref()
            .and_then(|p| p.get(&format!("{}.{}", siid, piid)))
    }

    pub fn is_empty(&self) -> bool {
        self.patches.as_ref().is_none_or(|p| p.is_empty())
    }
}

/// Apply a full patch body onto a freshly parsed property.
pub fn apply_patch(property: &mut SpecProperty, patch: &Value) {
    let Some(patch) = patch.as_object() else {
        tracing::warn!(urn = %property.urn, "modify patch is not an object, ignoring");
        return;
    };

    if let Some(name) = patch.get("name").and_then(Value::as_str) {
        property.name = name.to_string();
    }
    if let Some(format) = patch.get("format").and_then(Value::as_str) {
        property.format = SpecFormat::from_wire(format);
    }
    if let Some(access) = patch.get("access").and_then(Value::as_array) {
        let modes: Vec<&str> = access.iter().filter_map(Value::as_str).collect();
        property.access = SpecAccess::from_wire(&modes);
    }
    if let Some(range) = patch.get("value-range") {
        match wire::parse_value_range(range) {
            Some(range) => {
                property.precision = range.precision;
                property.value_range = Some(range);
            }
            None => tracing::warn!(urn = %property.urn, "unusable value-range patch"),
        }
    }
    if let Some(list) = patch.get("value-list") {
        let items = wire::parse_value_list_items(list);
        if items.is_empty() {
            tracing::warn!(urn = %property.urn, "unusable value-list patch");
        } else {
            property.value_list = Some(SpecValueList::from_items(items));
        }
    }
    reapply_metadata_inner(property, patch);
}

/// Re-apply only the metadata keys (`unit`, `icon`, `expr`) onto a
/// cache-loaded property, so bundled corrections shipped after the graph was
/// cached still take effect without a refetch.
pub fn reapply_metadata(property: &mut SpecProperty, patch: &Value) {
    if let Some(patch) = patch.as_object() {
        reapply_metadata_inner(property, patch);
    }
}

fn reapply_metadata_inner(property: &mut SpecProperty, patch: &serde_json::Map<String, Value>) {
    if let Some(unit) = patch.get("unit").and_then(Value::as_str) {
        property.unit = Some(unit.to_string());
    }
    if let Some(icon) = patch.get("icon").and_then(Value::as_str) {
        property.icon = Some(icon.to_string());
    }
    if let Some(expr) = patch.get("expr").and_then(Value::as_str) {
        property.expr = Some(expr.to_string());
    }
}
