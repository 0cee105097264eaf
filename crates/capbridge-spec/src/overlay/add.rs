//! Service injection rules.
//!
//! A handful of devices omit services their firmware actually exposes. The
//! add table carries raw service fragments, keyed by exact identifier, that
//! are appended to the document's service list before structural parsing.

use serde_json::Value;

use super::resolve_alias;

/// Identifier-keyed table of raw service fragments.
#[derive(Debug, Default)]
pub struct SpecAdd {
    fragments: serde_json::Map<String, Value>,
}

impl SpecAdd {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            fragments: serde_json::from_str(text)?,
        })
    }

    /// Raw service fragments to append for an identifier. Each fragment is
    /// stamped `"filter": false` so an injected service always survives the
    /// filter layer.
    pub fn services_for(&self, identifier: &str) -> Vec<Value> {
        let Some(value) = resolve_alias(&self.fragments, identifier) else {
            return Vec::new();
        };
        let Some(entries) = value.as_array() else {
            tracing::warn!(identifier, "add-table entry is not an array, ignoring");
            return Vec::new();
        };
        entries
            .iter()
            .map(|fragment| {
                let mut fragment = fragment.clone();
                if let Some(obj) = fragment.as_object_mut() {
                    obj.insert("filter".to_string(), Value::Bool(false));
                }
                fragment
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
