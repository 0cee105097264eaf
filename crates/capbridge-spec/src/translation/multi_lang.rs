//! Per-instance description tables.
//!
//! Cloud translations arrive per identifier as `{ language: { tag: text } }`
//! where a tag addresses one node with a compact path:
//!
//! ```text
//! s:2           service 2
//! s:2:p:1       property 1 of service 2
//! s:2:p:1:v:0   enumeration item 0 of that property
//! s:2:e:1       event 1 of service 2
//! s:2:a:1       action 1 of service 2
//! ```
//!
//! The packaged `multi_lang.json` override uses the same shape keyed by
//! exact identifier and wins over the cloud data.

use std::collections::HashMap;

use serde_json::Value;

use crate::overlay::resolve_alias;

pub fn service_tag(siid: u32) -> String {
    format!("s:{}", siid)
}

pub fn property_tag(siid: u32, piid: u32) -> String {
    format!("s:{}:p:{}", siid, piid)
}

pub fn value_tag(siid: u32, piid: u32, index: usize) -> String {
    format!("s:{}:p:{}:v:{}", siid, piid, index)
}

pub fn event_tag(siid: u32, eiid: u32) -> String {
    format!("s:{}:e:{}", siid, eiid)
}

pub fn action_tag(siid: u32, aiid: u32) -> String {
    format!("s:{}:a:{}", siid, aiid)
}

/// Packaged per-instance override table.
#[derive(Debug, Default)]
pub struct LocalOverride {
    entries: serde_json::Map<String, Value>,
}

impl LocalOverride {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_str(text)?,
        })
    }

    /// Tag → text map for one identifier and language, empty when the
    /// identifier has no override.
    pub fn table_for(&self, identifier: &str, lang: &str) -> HashMap<String, String> {
        match resolve_alias(&self.entries, identifier) {
            Some(value) => select_language(value, lang),
            None => HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merged tag → text table for one (identifier, language) parse.
#[derive(Debug, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    /// Build from a raw cloud response, selecting the requested language
    /// with English fallback. Anything unusable yields an empty table.
    pub fn from_cloud(raw: &Value, lang: &str) -> Self {
        Self {
            entries: select_language(raw, lang),
        }
    }

    /// Merge the packaged override on top; its entries win.
    pub fn apply_override(&mut self, entries: HashMap<String, String>) {
        self.entries.extend(entries);
    }

    /// Translated text for a node path tag. Empty strings count as absent so
    /// the caller's fallback chain keeps going.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .get(tag)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn select_language(raw: &Value, lang: &str) -> HashMap<String, String> {
    let Some(by_lang) = raw.as_object() else {
        return HashMap::new();
    };
    let Some(table) = by_lang.get(lang).or_else(|| by_lang.get("en")) else {
        return HashMap::new();
    };
    let Some(table) = table.as_object() else {
        return HashMap::new();
    };
    table
        .iter()
        .filter_map(|(tag, text)| {
            text.as_str()
                .map(|text| (tag.clone(), text.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags() {
        assert_eq!(service_tag(2), "s:2");
        assert_eq!(property_tag(2, 1), "s:2:p:1");
        assert_eq!(value_tag(2, 1, 0), "s:2:p:1:v:0");
        assert_eq!(event_tag(2, 3), "s:2:e:3");
        assert_eq!(action_tag(2, 4), "s:2:a:4");
    }

    #[test]
    fn test_cloud_language_selection_with_fallback() {
        let raw = json!({
            "en": {"s:2": "Air Conditioner", "s:2:p:1": "Power"},
            "de": {"s:2": "Klimaanlage"}
        });
        let table = TranslationTable::from_cloud(&raw, "de");
        assert_eq!(table.get("s:2"), Some("Klimaanlage"));
        // Missing language falls back to English wholesale.
        let table = TranslationTable::from_cloud(&raw, "fr");
        assert_eq!(table.get("s:2"), Some("Air Conditioner"));
        // Garbage yields an empty table, not an error.
        assert!(TranslationTable::from_cloud(&json!([1, 2]), "en").is_empty());
    }

    #[test]
    fn test_override_wins() {
        let over = LocalOverride::from_json(
            r#"{
            "urn:cap-spec-v2:device:ac:0000A004:acme-mc5:1": {
                "en": {"s:2:p:1": "Switch"}
            }
        }"#,
        )
        .unwrap();

        let raw = json!({"en": {"s:2:p:1": "Power", "s:2:p:2": "Mode"}});
        let mut table = TranslationTable::from_cloud(&raw, "en");
        table.apply_override(
            over.table_for("urn:cap-spec-v2:device:ac:0000A004:acme-mc5:1", "en"),
        );

        assert_eq!(table.get("s:2:p:1"), Some("Switch"));
        assert_eq!(table.get("s:2:p:2"), Some("Mode"));
    }

    #[test]
    fn test_empty_text_is_absent() {
        let table = TranslationTable::from_cloud(&json!({"en": {"s:1": ""}}), "en");
        assert_eq!(table.get("s:1"), None);
    }
}
