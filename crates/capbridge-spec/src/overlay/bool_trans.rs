//! Boolean value descriptions.
//!
//! Boolean properties carry no value list of their own, but selects and
//! diagnostics want readable state names ("Open"/"Closed" instead of
//! true/false). This layer supplies `{true, false}` description pairs per
//! property type prefix, with a global default, and synthesizes the two-item
//! enumeration the rest of the pipeline treats like any declared list.

use std::collections::HashMap;

use capbridge_core::node::{SpecValueList, SpecValueListItem};
use capbridge_core::urn;
use capbridge_core::value::SpecValue;
use serde::Deserialize;

const DEFAULT_KEY: &str = "default";
const FALLBACK_LANG: &str = "en";

#[derive(Debug, Clone, Deserialize)]
pub struct BoolPair {
    #[serde(rename = "true")]
    pub true_text: String,
    #[serde(rename = "false")]
    pub false_text: String,
}

/// Boolean description table.
#[derive(Debug, Default, Deserialize)]
pub struct BoolTranslation {
    /// Property type prefix → translate key.
    #[serde(default)]
    data: HashMap<String, String>,
    /// Translate key → language → description pair.
    #[serde(default)]
    translate: HashMap<String, HashMap<String, BoolPair>>,
}

impl BoolTranslation {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Description pair for a boolean property. Falls back from the
    /// property-specific key to the global default, and from the requested
    /// language to English; the last resort is the bare literals.
    pub fn texts(&self, property_urn: &str, lang: &str) -> (String, String) {
        let key = urn::type_prefix(property_urn)
            .and_then(|prefix| self.data.get(prefix))
            .map(String::as_str)
            .unwrap_or(DEFAULT_KEY);
        let pair = self
            .translate
            .get(key)
            .or_else(|| self.translate.get(DEFAULT_KEY))
            .and_then(|langs| langs.get(lang).or_else(|| langs.get(FALLBACK_LANG)));
        match pair {
            Some(pair) => (pair.true_text.clone(), pair.false_text.clone()),
            None => ("True".to_string(), "False".to_string()),
        }
    }

    /// Synthesized enumeration for a boolean property with no declared list.
    pub fn value_list(&self, property_urn: &str, lang: &str) -> SpecValueList {
        let (true_text, false_text) = self.texts(property_urn, lang);
        SpecValueList::from_items(vec![
            SpecValueListItem {
                value: SpecValue::Bool(true),
                name: "true".to_string(),
                description: true_text,
            },
            SpecValueListItem {
                value: SpecValue::Bool(false),
                name: "false".to_string(),
                description: false_text,
            },
        ])
    }
}
