//! Canonical capability graph types.
//!
//! A parsed device specification is a `SpecInstance` tree:
//!
//! ```text
//! SpecInstance
//! └── SpecService (×n)
//!     ├── SpecProperty (×n)
//!     ├── SpecEvent    (×n, argument properties by handle)
//!     └── SpecAction   (×n, input/output properties by handle)
//! ```
//!
//! Every node carries a [`NodeHandle`] assigned in document order when the
//! graph is built. Handles are serialized with the graph, so identity
//! survives a cache round-trip, and the mapping engine keys its claim map on
//! them instead of mutating shared nodes.

use serde::{Deserialize, Serialize};

use crate::urn;
use crate::value::SpecValue;

/// Stable integer handle identifying one node within a parsed instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct NodeHandle(pub u32);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of node a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Service,
    Property,
    Event,
    Action,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Property => "property",
            Self::Event => "event",
            Self::Action => "action",
        }
    }
}

/// Declared value format of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    Integer,
    Float,
    Bool,
    #[default]
    String,
}

impl SpecFormat {
    /// Map a raw document format string onto the closed format set.
    ///
    /// The wire dialect spells sized integers out (`int8` … `uint32`); all of
    /// them collapse to [`SpecFormat::Integer`]. Unrecognized strings fall
    /// back to `String` so a single odd property cannot poison a parse.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "bool" => Self::Bool,
            "string" => Self::String,
            "float" => Self::Float,
            s if s.starts_with("int") || s.starts_with("uint") => Self::Integer,
            other => {
                tracing::debug!("unknown property format '{}', treating as string", other);
                Self::String
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

/// Access capabilities of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecAccess {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub notify: bool,
}

impl SpecAccess {
    pub const fn new(read: bool, write: bool, notify: bool) -> Self {
        Self {
            read,
            write,
            notify,
        }
    }

    /// Parse the wire form, a list of `"read"` / `"write"` / `"notify"`
    /// strings. Unknown entries are ignored.
    pub fn from_wire<S: AsRef<str>>(modes: &[S]) -> Self {
        let mut access = Self::default();
        for mode in modes {
            match mode.as_ref() {
                "read" => access.read = true,
                "write" => access.write = true,
                "notify" => access.notify = true,
                _ => {}
            }
        }
        access
    }

    /// Whether every mode required by `other` is present here.
    pub fn contains(&self, other: &SpecAccess) -> bool {
        (self.read || !other.read) && (self.write || !other.write) && (self.notify || !other.notify)
    }

    pub fn readable(&self) -> bool {
        self.read
    }

    pub fn writable(&self) -> bool {
        self.write
    }

    pub fn notifiable(&self) -> bool {
        self.notify
    }
}

/// Numeric domain of a property: minimum, maximum and step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecValueRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Decimal places implied by the step, derived from its decimal string
    /// form rather than from float inspection.
    #[serde(default)]
    pub precision: u8,
}

impl SpecValueRange {
    /// Build a range from raw document numbers.
    ///
    /// Precision counts the digits after the decimal point in the step's
    /// minimal representation (trailing zeros stripped): step `0.5` → 1,
    /// step `1` → 0, step `1e-7` → 7. Going through the decimal string
    /// avoids binary rounding artifacts for steps like `0.1`.
    pub fn from_wire(min: f64, max: f64, step: &serde_json::Number) -> Self {
        Self {
            min,
            max,
            step: step.as_f64().unwrap_or(1.0),
            precision: step_precision(&step.to_string()),
        }
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

fn step_precision(repr: &str) -> u8 {
    // Tiny steps render in scientific notation ("1e-7"): the decimal places
    // are the mantissa's fractional digits shifted by the exponent.
    if let Some((mantissa, exponent)) = repr.split_once(['e', 'E']) {
        let frac = mantissa
            .split_once('.')
            .map_or(0, |(_, frac)| frac.trim_end_matches('0').len() as i32);
        let shift: i32 = exponent.parse().unwrap_or(0);
        return (frac - shift).clamp(0, i32::from(u8::MAX)) as u8;
    }
    match repr.split_once('.') {
        Some((_, frac)) => frac.trim_end_matches('0').len() as u8,
        None => 0,
    }
}

/// One entry of an enumerated value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecValueListItem {
    /// Internal wire value.
    pub value: SpecValue,
    /// Machine name from the vendor vocabulary.
    pub name: String,
    /// Human description, unique within the owning list.
    pub description: String,
}

/// Ordered enumeration of the values a property may take.
///
/// Lists are small (a handful of modes); lookups are linear scans in both
/// directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecValueList {
    pub items: Vec<SpecValueListItem>,
}

impl SpecValueList {
    /// Build a list, disambiguating duplicate descriptions by suffixing the
    /// occurrence count starting with the second one ("auto", "auto-2").
    pub fn from_items(items: Vec<SpecValueListItem>) -> Self {
        let mut seen: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
        let mut out = Vec::with_capacity(items.len());
        for mut item in items {
            let count = seen.entry(item.description.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                item.description = format!("{}-{}", item.description, count);
            }
            out.push(item);
        }
        Self { items: out }
    }

    /// Description for an internal value, if the value is listed.
    pub fn description_of(&self, value: &SpecValue) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.value == *value)
            .map(|item| item.description.as_str())
    }

    /// Internal value for a description, if the description is listed.
    pub fn value_of(&self, description: &str) -> Option<SpecValue> {
        self.items
            .iter()
            .find(|item| item.description == description)
            .map(|item| item.value.clone())
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.description.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A property node: one readable/writable/notifiable value of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecProperty {
    pub handle: NodeHandle,
    /// Integer id within the owning service.
    pub iid: u32,
    /// Full type URN.
    pub urn: String,
    /// Machine name (URN name segment).
    pub name: String,
    /// Translated human description, never empty.
    pub description: String,
    pub format: SpecFormat,
    pub access: SpecAccess,
    /// Unit from the vendor vocabulary (overlay-patchable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_range: Option<SpecValueRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_list: Option<SpecValueList>,
    /// Post-read arithmetic expression attached by the Modify layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    /// Icon override attached by the Modify layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Decimal places reported for float values, taken from the range step.
    #[serde(default)]
    pub precision: u8,
}

impl SpecProperty {
    pub fn readable(&self) -> bool {
        self.access.read
    }

    pub fn writable(&self) -> bool {
        self.access.write
    }

    pub fn notifiable(&self) -> bool {
        self.access.notify
    }

    /// Whether the property carries an enumerated value domain (declared or
    /// synthesized for booleans).
    pub fn has_value_list(&self) -> bool {
        self.value_list.as_ref().is_some_and(|l| !l.is_empty())
    }

    pub fn has_value_range(&self) -> bool {
        self.value_range.is_some()
    }
}

/// An event node: a notification with referenced argument properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecEvent {
    pub handle: NodeHandle,
    pub iid: u32,
    pub urn: String,
    pub name: String,
    pub description: String,
    /// Properties reported with the event, in declaration order.
    pub arguments: Vec<NodeHandle>,
}

/// An action node: an invokable operation with input/output properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecAction {
    pub handle: NodeHandle,
    pub iid: u32,
    pub urn: String,
    pub name: String,
    pub description: String,
    pub input: Vec<NodeHandle>,
    pub output: Vec<NodeHandle>,
}

/// A service node: one capability grouping of an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecService {
    pub handle: NodeHandle,
    pub iid: u32,
    pub urn: String,
    pub name: String,
    pub description: String,
    /// True when the service type lives outside the standard vocabulary.
    pub proprietary: bool,
    /// True when the Filter layer (or the document itself) excludes this
    /// service from entity mapping. Filtered services stay in the graph but
    /// are invisible to the mapping engine and the platform grouping.
    #[serde(default)]
    pub filtered: bool,
    pub properties: Vec<SpecProperty>,
    pub events: Vec<SpecEvent>,
    pub actions: Vec<SpecAction>,
}

impl SpecService {
    pub fn property(&self, iid: u32) -> Option<&SpecProperty> {
        self.properties.iter().find(|p| p.iid == iid)
    }

    pub fn property_by_name(&self, name: &str) -> Option<&SpecProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn action_by_name(&self, name: &str) -> Option<&SpecAction> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// One device's capability root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecInstance {
    /// Versioned URN naming this capability specification.
    pub identifier: String,
    /// Machine name (URN name segment), e.g. `air-conditioner`.
    pub name: String,
    /// Translated human description.
    pub description: String,
    pub services: Vec<SpecService>,
}

impl SpecInstance {
    pub fn new(identifier: impl Into<String>, description: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let name = urn::name(&identifier).to_string();
        Self {
            identifier,
            name,
            description: description.into(),
            services: Vec::new(),
        }
    }

    pub fn service_by_name(&self, name: &str) -> Option<&SpecService> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn service_by_handle(&self, handle: NodeHandle) -> Option<&SpecService> {
        self.services.iter().find(|s| s.handle == handle)
    }

    /// Locate a property by handle together with its owning service.
    pub fn property_by_handle(&self, handle: NodeHandle) -> Option<(&SpecService, &SpecProperty)> {
        for service in &self.services {
            if let Some(property) = service.properties.iter().find(|p| p.handle == handle) {
                return Some((service, property));
            }
        }
        None
    }

    /// Locate an action by handle together with its owning service.
    pub fn action_by_handle(&self, handle: NodeHandle) -> Option<(&SpecService, &SpecAction)> {
        for service in &self.services {
            if let Some(action) = service.actions.iter().find(|a| a.handle == handle) {
                return Some((service, action));
            }
        }
        None
    }

    /// Total node count (services and their members).
    pub fn node_count(&self) -> usize {
        self.services
            .iter()
            .map(|s| 1 + s.properties.len() + s.events.len() + s.actions.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_wire() {
        assert_eq!(SpecFormat::from_wire("bool"), SpecFormat::Bool);
        assert_eq!(SpecFormat::from_wire("uint8"), SpecFormat::Integer);
        assert_eq!(SpecFormat::from_wire("int64"), SpecFormat::Integer);
        assert_eq!(SpecFormat::from_wire("float"), SpecFormat::Float);
        assert_eq!(SpecFormat::from_wire("hex"), SpecFormat::String);
    }

    #[test]
    fn test_access_from_wire() {
        let access = SpecAccess::from_wire(&["read", "notify", "bogus"]);
        assert!(access.read);
        assert!(!access.write);
        assert!(access.notify);
    }

    #[test]
    fn test_access_contains() {
        let rw = SpecAccess::new(true, true, false);
        assert!(rw.contains(&SpecAccess::new(true, false, false)));
        assert!(rw.contains(&SpecAccess::new(true, true, false)));
        assert!(!rw.contains(&SpecAccess::new(false, false, true)));
    }

    #[test]
    fn test_range_precision_from_step() {
        let step = serde_json::Number::from_f64(0.5).unwrap();
        let range = SpecValueRange::from_wire(16.0, 30.0, &step);
        assert_eq!(range.precision, 1);

        let range = SpecValueRange::from_wire(0.0, 100.0, &serde_json::Number::from(1u32));
        assert_eq!(range.precision, 0);

        // "1.0" strips to no fractional digits.
        let step = serde_json::Number::from_f64(1.0).unwrap();
        let range = SpecValueRange::from_wire(0.0, 1.0, &step);
        assert_eq!(range.precision, 0);

        let range =
            SpecValueRange::from_wire(0.0, 1.0, &serde_json::Number::from_f64(0.125).unwrap());
        assert_eq!(range.precision, 3);

        // Steps this small print in scientific notation ("1e-7").
        let step = serde_json::Number::from_f64(0.000_000_1).unwrap();
        let range = SpecValueRange::from_wire(0.0, 1.0, &step);
        assert_eq!(range.precision, 7);

        // A fractional mantissa shifts with the exponent: 1.5e-7 has eight
        // decimal places.
        let step = serde_json::Number::from_f64(0.000_000_15).unwrap();
        let range = SpecValueRange::from_wire(0.0, 1.0, &step);
        assert_eq!(range.precision, 8);
    }

    #[test]
    fn test_value_list_dedup() {
        let list = SpecValueList::from_items(vec![
            SpecValueListItem {
                value: SpecValue::Int(0),
                name: "auto".into(),
                description: "Auto".into(),
            },
            SpecValueListItem {
                value: SpecValue::Int(1),
                name: "auto2".into(),
                description: "Auto".into(),
            },
            SpecValueListItem {
                value: SpecValue::Int(2),
                name: "auto3".into(),
                description: "Auto".into(),
            },
        ]);
        assert_eq!(list.descriptions(), vec!["Auto", "Auto-2", "Auto-3"]);
    }

    #[test]
    fn test_value_list_round_trip() {
        let list = SpecValueList::from_items(vec![
            SpecValueListItem {
                value: SpecValue::Int(1),
                name: "low".into(),
                description: "Low".into(),
            },
            SpecValueListItem {
                value: SpecValue::Int(2),
                name: "high".into(),
                description: "High".into(),
            },
        ]);
        for item in &list.items {
            let description = list.description_of(&item.value).unwrap();
            assert_eq!(list.value_of(description), Some(item.value.clone()));
        }
        assert_eq!(list.description_of(&SpecValue::Int(9)), None);
        assert_eq!(list.value_of("Medium"), None);
    }

    #[test]
    fn test_instance_lookup() {
        let mut instance = SpecInstance::new(
            "urn:cap-spec-v2:device:air-conditioner:0000A004:acme-mc5:1",
            "Air Conditioner",
        );
        assert_eq!(instance.name, "air-conditioner");

        instance.services.push(SpecService {
            handle: NodeHandle(1),
            iid: 2,
            urn: "urn:cap-spec-v2:service:air-conditioner:00007808:acme-mc5:1".into(),
            name: "air-conditioner".into(),
            description: "Air Conditioner".into(),
            proprietary: false,
            filtered: false,
            properties: vec![SpecProperty {
                handle: NodeHandle(2),
                iid: 1,
                urn: "urn:cap-spec-v2:property:on:00000006:acme-mc5:1".into(),
                name: "on".into(),
                description: "Power".into(),
                format: SpecFormat::Bool,
                access: SpecAccess::new(true, true, true),
                unit: None,
                value_range: None,
                value_list: None,
                expr: None,
                icon: None,
                precision: 0,
            }],
            events: vec![],
            actions: vec![],
        });

        let (service, property) = instance.property_by_handle(NodeHandle(2)).unwrap();
        assert_eq!(service.iid, 2);
        assert_eq!(property.name, "on");
        assert!(instance.property_by_handle(NodeHandle(9)).is_none());
        assert_eq!(instance.node_count(), 2);
    }
}
