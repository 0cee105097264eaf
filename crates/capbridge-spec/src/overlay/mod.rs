//! Overlay correction layers.
//!
//! Vendor capability documents are imperfect: services are missing, fields
//! are wrong, descriptions are untranslated. Each correction concern lives in
//! its own bundled JSON table, loaded once and applied during parsing:
//!
//! - [`SpecFilter`]: suppress services and nodes
//! - [`SpecAdd`]: inject missing service fragments
//! - [`SpecModify`]: patch parsed property fields
//! - [`BoolTranslation`]: readable true/false descriptions
//!
//! plus the two translation layers from [`crate::translation`]. In every
//! identifier-keyed table a string value is an alias: "use that key's data
//! instead". [`OverlayStack`] bundles all six layers and is passed explicitly
//! into the parser.

pub mod add;
pub mod bool_trans;
pub mod filter;
pub mod modify;

pub use add::SpecAdd;
pub use bool_trans::{BoolPair, BoolTranslation};
pub use filter::{FilterView, SpecFilter};
pub use modify::{ModifyView, SpecModify};

use serde_json::Value;
use tokio::sync::RwLock;

use crate::translation::multi_lang::LocalOverride;
use crate::translation::std_lib::SpecStdLib;

/// Hard cap on alias hops; real tables chain once or twice.
const MAX_ALIAS_DEPTH: usize = 8;

/// Look up `key`, following string aliases. A cycle, a dangling alias or an
/// over-deep chain resolves to "no entry" with a warning; a plain miss stays
/// silent.
pub(crate) fn resolve_alias<'a>(
    table: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    let mut visited: Vec<&str> = Vec::new();
    let mut current: &str = key;

    for _ in 0..MAX_ALIAS_DEPTH {
        let value = match table.get(current) {
            Some(value) => value,
            None => {
                if !visited.is_empty() {
                    tracing::warn!(key, target = current, "overlay alias points at a missing key");
                }
                return None;
            }
        };
        match value.as_str() {
            Some(alias) => {
                visited.push(current);
                if visited.contains(&alias) {
                    tracing::warn!(key, alias, "overlay alias cycle, treating as no entry");
                    return None;
                }
                current = alias;
            }
            None => return Some(value),
        }
    }

    tracing::warn!(key, "overlay alias chain exceeds depth limit, treating as no entry");
    None
}

/// The six correction layers, constructed once and shared by reference.
///
/// Five layers are static bundled tables. The standard-library dictionaries
/// sit behind a lock because they are refreshed from the network after
/// construction.
#[derive(Debug)]
pub struct OverlayStack {
    pub filter: SpecFilter,
    pub add: SpecAdd,
    pub modify: SpecModify,
    pub bool_trans: BoolTranslation,
    pub local_override: LocalOverride,
    pub std_lib: RwLock<SpecStdLib>,
}

impl OverlayStack {
    /// Load every layer from the bundled resources. A malformed resource
    /// disables that one layer; the rest of the stack is unaffected.
    pub fn load() -> Self {
        Self {
            filter: load_layer(
                "spec_filter.json",
                include_str!("../../assets/spec_filter.json"),
                SpecFilter::from_json,
            ),
            add: load_layer(
                "spec_add.json",
                include_str!("../../assets/spec_add.json"),
                SpecAdd::from_json,
            ),
            modify: load_layer(
                "spec_modify.json",
                include_str!("../../assets/spec_modify.json"),
                SpecModify::from_json,
            ),
            bool_trans: load_layer(
                "bool_trans.json",
                include_str!("../../assets/bool_trans.json"),
                BoolTranslation::from_json,
            ),
            local_override: load_layer(
                "multi_lang.json",
                include_str!("../../assets/multi_lang.json"),
                LocalOverride::from_json,
            ),
            std_lib: RwLock::new(SpecStdLib::new()),
        }
    }

    /// A stack with every layer empty.
    pub fn empty() -> Self {
        Self {
            filter: SpecFilter::default(),
            add: SpecAdd::default(),
            modify: SpecModify::default(),
            bool_trans: BoolTranslation::default(),
            local_override: LocalOverride::default(),
            std_lib: RwLock::new(SpecStdLib::new()),
        }
    }

    pub fn with_filter(mut self, filter: SpecFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_add(mut self, add: SpecAdd) -> Self {
        self.add = add;
        self
    }

    pub fn with_modify(mut self, modify: SpecModify) -> Self {
        self.modify = modify;
        self
    }

    pub fn with_bool_trans(mut self, bool_trans: BoolTranslation) -> Self {
        self.bool_trans = bool_trans;
        self
    }

    pub fn with_local_override(mut self, local_override: LocalOverride) -> Self {
        self.local_override = local_override;
        self
    }
}

impl Default for OverlayStack {
    fn default() -> Self {
        Self::load()
    }
}

fn load_layer<T: Default>(
    resource: &str,
    text: &str,
    parse: fn(&str) -> Result<T, serde_json::Error>,
) -> T {
    match parse(text) {
        Ok(layer) => layer,
        Err(error) => {
            tracing::warn!(
                resource,
                %error,
                "bundled overlay resource is malformed, layer disabled"
            );
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_alias_chain_resolves() {
        let t = table(json!({
            "a": "b",
            "b": "c",
            "c": {"services": ["1"]}
        }));
        let resolved = resolve_alias(&t, "a").unwrap();
        assert_eq!(resolved["services"], json!(["1"]));
    }

    #[test]
    fn test_two_key_cycle_is_no_entry() {
        let t = table(json!({"a": "b", "b": "a"}));
        assert!(resolve_alias(&t, "a").is_none());
        assert!(resolve_alias(&t, "b").is_none());
    }

    #[test]
    fn test_self_alias_is_no_entry() {
        let t = table(json!({"a": "a"}));
        assert!(resolve_alias(&t, "a").is_none());
    }

    #[test]
    fn test_dangling_alias_is_no_entry() {
        let t = table(json!({"a": "missing"}));
        assert!(resolve_alias(&t, "a").is_none());
        // A plain miss is still a miss.
        assert!(resolve_alias(&t, "nope").is_none());
    }

    #[test]
    fn test_bundled_resources_parse() {
        let stack = OverlayStack::load();
        assert!(!stack.filter.is_empty());
        assert!(!stack.modify.is_empty());
    }
}
