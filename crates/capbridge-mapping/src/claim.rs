//! Classification output: the immutable claim map.
//!
//! Matching never mutates the capability graph. Each tier records its
//! decisions here, and a handle that already carries a claim keeps it, which
//! is what makes tier precedence hold regardless of iteration order.

use std::collections::{BTreeMap, HashMap};

use capbridge_core::node::{NodeHandle, NodeKind};
use capbridge_core::platform::{DeviceClass, EntityPlatform, StateClass};
use serde::{Deserialize, Serialize};

/// Which matching tier produced a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Device,
    Service,
    Property,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Service => "service",
            Self::Property => "property",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node's classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub platform: EntityPlatform,
    pub tier: MatchTier,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Claim {
    pub fn new(platform: EntityPlatform, tier: MatchTier, kind: NodeKind) -> Self {
        Self {
            platform,
            tier,
            kind,
            device_class: None,
            state_class: None,
            display_unit: None,
            icon: None,
        }
    }

    pub fn with_device_class(mut self, device_class: DeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    pub fn with_state_class(mut self, state_class: StateClass) -> Self {
        self.state_class = Some(state_class);
        self
    }

    pub fn with_display_unit(mut self, unit: impl Into<String>) -> Self {
        self.display_unit = Some(unit.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Handle → claim table for one classified instance.
///
/// Read-only to consumers; the engine fills it through [`EntityMap::claim`],
/// where the first writer for a handle wins.
#[derive(Debug, Default, Clone)]
pub struct EntityMap {
    claims: BTreeMap<NodeHandle, Claim>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim unless the handle is already claimed. Returns whether
    /// the claim was recorded.
    pub(crate) fn claim(&mut self, handle: NodeHandle, claim: Claim) -> bool {
        match self.claims.entry(handle) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(claim);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Claim> {
        self.claims.get(&handle)
    }

    pub fn is_claimed(&self, handle: NodeHandle) -> bool {
        self.claims.contains_key(&handle)
    }

    /// Handles claimed for one platform, in handle order.
    pub fn platform_nodes(&self, platform: EntityPlatform) -> Vec<NodeHandle> {
        self.claims
            .iter()
            .filter(|(_, claim)| claim.platform == platform)
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// All claims grouped by platform, groups ordered by platform name and
    /// handles in handle order.
    pub fn device_entities(&self) -> Vec<(EntityPlatform, Vec<NodeHandle>)> {
        let mut grouped: HashMap<EntityPlatform, Vec<NodeHandle>> = HashMap::new();
        for (handle, claim) in &self.claims {
            grouped.entry(claim.platform).or_default().push(*handle);
        }
        let mut entries: Vec<_> = grouped.into_iter().collect();
        entries.sort_by_key(|(platform, _)| platform.as_str());
        entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Claim)> {
        self.claims.iter().map(|(handle, claim)| (*handle, claim))
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor_claim() -> Claim {
        Claim::new(EntityPlatform::Sensor, MatchTier::Property, NodeKind::Property)
            .with_device_class(DeviceClass::Temperature)
            .with_state_class(StateClass::Measurement)
            .with_display_unit("°C")
    }

    #[test]
    fn test_first_claim_wins() {
        let mut map = EntityMap::new();
        let handle = NodeHandle(3);

        assert!(map.claim(handle, sensor_claim()));
        let second = Claim::new(EntityPlatform::Switch, MatchTier::Property, NodeKind::Property);
        assert!(!map.claim(handle, second));

        assert_eq!(map.get(handle).unwrap().platform, EntityPlatform::Sensor);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_platform_nodes_sorted_by_handle() {
        let mut map = EntityMap::new();
        map.claim(NodeHandle(9), sensor_claim());
        map.claim(NodeHandle(2), sensor_claim());
        map.claim(
            NodeHandle(5),
            Claim::new(EntityPlatform::Switch, MatchTier::Property, NodeKind::Property),
        );

        assert_eq!(
            map.platform_nodes(EntityPlatform::Sensor),
            vec![NodeHandle(2), NodeHandle(9)]
        );
        assert!(map.platform_nodes(EntityPlatform::Light).is_empty());
    }

    #[test]
    fn test_device_entities_groups_by_platform() {
        let mut map = EntityMap::new();
        map.claim(NodeHandle(1), sensor_claim());
        map.claim(
            NodeHandle(2),
            Claim::new(EntityPlatform::Switch, MatchTier::Property, NodeKind::Property),
        );
        map.claim(NodeHandle(4), sensor_claim());

        let grouped = map.device_entities();
        assert_eq!(grouped.len(), 2);
        // "sensor" sorts before "switch".
        assert_eq!(grouped[0].0, EntityPlatform::Sensor);
        assert_eq!(grouped[0].1, vec![NodeHandle(1), NodeHandle(4)]);
        assert_eq!(grouped[1].1, vec![NodeHandle(2)]);
    }
}
