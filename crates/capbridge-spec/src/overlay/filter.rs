//! Service and node suppression rules.
//!
//! Some vendor documents describe services or properties that make no sense
//! on the platform side (diagnostic counters, factory-test switches). The
//! filter table names them per identifier so they never enter the canonical
//! graph. Rule bodies look like:
//!
//! ```json
//! {
//!   "urn:cap-spec-v2:device:thermostat:0000A031:acme-t1": {
//!     "services": ["5"],
//!     "properties": ["2.3", "4.*"]
//!   }
//! }
//! ```
//!
//! Keys carry the identifier with its trailing version segment removed, so a
//! rule written for one firmware revision applies to all of them.

use capbridge_core::urn;
use serde::Deserialize;
use serde_json::Value;

use super::resolve_alias;

#[derive(Debug, Clone, Default, Deserialize)]
struct FilterRule {
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    actions: Vec<String>,
}

/// Identifier-keyed filter table.
#[derive(Debug, Default)]
pub struct SpecFilter {
    rules: serde_json::Map<String, Value>,
}

impl SpecFilter {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            rules: serde_json::from_str(text)?,
        })
    }

    /// Resolve the rule for an identifier (version stripped, aliases
    /// followed). An identifier without a rule yields a view that filters
    /// nothing.
    pub fn select(&self, identifier: &str) -> FilterView {
        let key = urn::without_version(identifier);
        let rule = resolve_alias(&self.rules, key).and_then(|value| {
            match serde_json::from_value::<FilterRule>(value.clone()) {
                Ok(rule) => Some(rule),
                Err(error) => {
                    tracing::warn!(key, %error, "unusable filter rule, ignoring");
                    None
                }
            }
        });
        FilterView { rule }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Filter decisions for one selected identifier.
#[derive(Debug, Default)]
pub struct FilterView {
    rule: Option<FilterRule>,
}

impl FilterView {
    pub fn filter_service(&self, siid: u32) -> bool {
        self.rule
            .as_ref()
            .is_some_and(|r| r.services.iter().any(|s| *s == siid.to_string()))
    }

    pub fn filter_property(&self, siid: u32, piid: u32) -> bool {
        self.rule
            .as_ref()
            .is_some_and(|r| matches_item(&r.properties, siid, piid))
    }

    pub fn filter_event(&self, siid: u32, eiid: u32) -> bool {
        self.rule
            .as_ref()
            .is_some_and(|r| matches_item(&r.events, siid, eiid))
    }

    pub fn filter_action(&self, siid: u32, aiid: u32) -> bool {
        self.rule
            .as_ref()
            .is_some_and(|r| matches_item(&r.actions, siid, aiid))
    }
}

/// Entries are `"<siid>.<iid>"` or the per-service wildcard `"<siid>.*"`.
fn matches_item(entries: &[String], siid: u32, iid: u32) -> bool {
    let exact = format!("{}.{}", siid, iid);
    let wildcard = format!("{}.*", siid);
    entries.iter().any(|e| *e == exact || *e == wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "urn:cap-spec-v2:device:thermostat:0000A031:acme-t1": {
            "services": ["5"],
            "properties": ["2.3", "4.*"],
            "actions": ["2.1"]
        },
        "urn:cap-spec-v2:device:thermostat:0000A031:acme-t2":
            "urn:cap-spec-v2:device:thermostat:0000A031:acme-t1"
    }"#;

    #[test]
    fn test_select_strips_version_and_matches() {
        let filter = SpecFilter::from_json(RULES).unwrap();
        let view = filter.select("urn:cap-spec-v2:device:thermostat:0000A031:acme-t1:2");
        assert!(view.filter_service(5));
        assert!(!view.filter_service(2));
        assert!(view.filter_property(2, 3));
        assert!(!view.filter_property(2, 4));
        assert!(view.filter_action(2, 1));
        assert!(!view.filter_event(2, 1));
    }

    #[test]
    fn test_wildcard_covers_whole_service() {
        let filter = SpecFilter::from_json(RULES).unwrap();
        let view = filter.select("urn:cap-spec-v2:device:thermostat:0000A031:acme-t1:1");
        for piid in 1..10 {
            assert!(view.filter_property(4, piid));
        }
        assert!(!view.filter_property(3, 1));
    }

    #[test]
    fn test_alias_resolves_to_target_rule() {
        let filter = SpecFilter::from_json(RULES).unwrap();
        let view = filter.select("urn:cap-spec-v2:device:thermostat:0000A031:acme-t2:1");
        assert!(view.filter_service(5));
        assert!(view.filter_property(4, 9));
    }

    #[test]
    fn test_unknown_identifier_filters_nothing() {
        let filter = SpecFilter::from_json(RULES).unwrap();
        let view = filter.select("urn:cap-spec-v2:device:fan:0000A005:other-f1:1");
        assert!(!view.filter_service(1));
        assert!(!view.filter_property(1, 1));
    }
}
