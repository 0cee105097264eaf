//! Three-tier matching engine.
//!
//! Tier 1 matches whole-device templates, tier 2 single-service templates,
//! tier 3 classifies leftover properties individually. Earlier tiers claim
//! handles in the [`EntityMap`]; a claimed service is invisible to later
//! tiers together with everything it claimed. Filtered services never
//! participate at all.

use capbridge_core::node::{NodeKind, SpecFormat, SpecInstance, SpecProperty, SpecService};
use capbridge_core::platform::EntityPlatform;

use crate::claim::{Claim, EntityMap, MatchTier};
use crate::rules::{self, DeviceTemplate, ServiceRule, ServiceTemplate};

/// Stateless classifier over static pattern tables.
pub struct EntityMapper {
    devices: &'static [DeviceTemplate],
    services: &'static [ServiceTemplate],
}

impl EntityMapper {
    pub fn new() -> Self {
        Self {
            devices: rules::DEVICE_TEMPLATES,
            services: rules::SERVICE_TEMPLATES,
        }
    }

    /// Engine over caller-supplied tables.
    pub fn with_tables(
        devices: &'static [DeviceTemplate],
        services: &'static [ServiceTemplate],
    ) -> Self {
        Self { devices, services }
    }

    /// Classify every node of an instance into the claim map. Pure: the
    /// graph is never mutated, and reclassifying yields an equal map.
    pub fn classify(&self, instance: &SpecInstance) -> EntityMap {
        let mut map = EntityMap::new();
        self.match_device_templates(instance, &mut map);
        self.match_service_templates(instance, &mut map);
        self.match_property_fallback(instance, &mut map);
        tracing::debug!(
            identifier = %instance.identifier,
            claims = map.len(),
            "classification finished"
        );
        map
    }

    /// Tier 1. The first template whose required services all qualify wins;
    /// a device gets at most one device-level classification.
    fn match_device_templates(&self, instance: &SpecInstance, map: &mut EntityMap) {
        for template in self.devices {
            let Some(qualified) = qualify_device(template, instance) else {
                continue;
            };
            for (service, rule) in &qualified {
                claim_service_nodes(service, rule, template.platform, MatchTier::Device, map);
            }
            tracing::debug!(
                identifier = %instance.identifier,
                platform = template.platform.as_str(),
                services = qualified.len(),
                "device template matched"
            );
            return;
        }
    }

    /// Tier 2: any unclaimed service matching a service template becomes a
    /// single entity of that template's platform.
    fn match_service_templates(&self, instance: &SpecInstance, map: &mut EntityMap) {
        for service in &instance.services {
            if service.filtered || map.is_claimed(service.handle) {
                continue;
            }
            for template in self.services {
                if template.rule.service != service.name || !rule_passes(service, &template.rule) {
                    continue;
                }
                claim_service_nodes(
                    service,
                    &template.rule,
                    template.platform,
                    MatchTier::Service,
                    map,
                );
                tracing::debug!(
                    service = %service.name,
                    platform = template.platform.as_str(),
                    "service template matched"
                );
                break;
            }
        }
    }

    /// Tier 3: leftover readable-or-writable properties of unclaimed
    /// services, override table first, generic ladder second.
    fn match_property_fallback(&self, instance: &SpecInstance, map: &mut EntityMap) {
        for service in &instance.services {
            if service.filtered || map.is_claimed(service.handle) {
                continue;
            }
            for property in &service.properties {
                if map.is_claimed(property.handle)
                    || !(property.readable() || property.writable())
                {
                    continue;
                }
                if let Some(claim) = classify_property(property) {
                    map.claim(property.handle, claim);
                }
            }
        }
    }
}

impl Default for EntityMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a template against an instance. Success returns the services that
/// contribute (all required plus the passing optionals) with their rules;
/// any failing required service rejects the whole template.
fn qualify_device<'a>(
    template: &DeviceTemplate,
    instance: &'a SpecInstance,
) -> Option<Vec<(&'a SpecService, &'static ServiceRule)>> {
    let mut qualified = Vec::new();
    for rule in template.required {
        let service = find_service(instance, rule.service)?;
        if !rule_passes(service, rule) {
            return None;
        }
        qualified.push((service, rule));
    }
    for rule in template.optional {
        if let Some(service) = find_service(instance, rule.service) {
            if rule_passes(service, rule) {
                qualified.push((service, rule));
            }
        }
    }
    Some(qualified)
}

fn find_service<'a>(instance: &'a SpecInstance, name: &str) -> Option<&'a SpecService> {
    instance
        .services
        .iter()
        .find(|s| !s.filtered && s.name == name)
}

/// Required properties must exist with the required access modes, required
/// actions must exist by name.
fn rule_passes(service: &SpecService, rule: &ServiceRule) -> bool {
    for required in rule.required {
        match service.property_by_name(required.name) {
            Some(property) if property.access.contains(&required.access) => {}
            _ => return false,
        }
    }
    rule.actions
        .iter()
        .all(|name| service.action_by_name(name).is_some())
}

/// Claim the service plus every property and action the rule references.
fn claim_service_nodes(
    service: &SpecService,
    rule: &ServiceRule,
    platform: EntityPlatform,
    tier: MatchTier,
    map: &mut EntityMap,
) {
    map.claim(service.handle, Claim::new(platform, tier, NodeKind::Service));
    for required in rule.required {
        if let Some(property) = service.property_by_name(required.name) {
            map.claim(property.handle, Claim::new(platform, tier, NodeKind::Property));
        }
    }
    for name in rule.optional {
        if let Some(property) = service.property_by_name(name) {
            map.claim(property.handle, Claim::new(platform, tier, NodeKind::Property));
        }
    }
    for name in rule.actions {
        if let Some(action) = service.action_by_name(name) {
            map.claim(action.handle, Claim::new(platform, tier, NodeKind::Action));
        }
    }
}

/// Tier-3 classification of one property.
fn classify_property(property: &SpecProperty) -> Option<Claim> {
    if let Some(ov) = rules::property_override(&property.name) {
        if rules::access_permitted(&property.access, &ov.requires, &ov.rejects)
            && ov.formats.contains(&property.format)
        {
            let mut claim = Claim::new(ov.platform, MatchTier::Property, NodeKind::Property)
                .with_device_class(ov.device_class);
            if let Some(state_class) = ov.state_class {
                claim = claim.with_state_class(state_class);
            }
            let display = ov.unit.map(str::to_string).or_else(|| {
                property
                    .unit
                    .as_deref()
                    .and_then(rules::display_unit)
                    .map(str::to_string)
            });
            if let Some(display) = display {
                claim = claim.with_display_unit(display);
            }
            return Some(claim);
        }
    }

    // Boolean-before-enumeration matters: every parsed boolean carries a
    // synthesized two-item list.
    let platform = if property.writable() && property.format == SpecFormat::String {
        EntityPlatform::Text
    } else if property.writable() && property.format == SpecFormat::Bool {
        EntityPlatform::Switch
    } else if property.writable() && property.has_value_list() {
        EntityPlatform::Select
    } else if property.writable() && property.has_value_range() {
        EntityPlatform::Number
    } else if (property.readable() || property.notifiable()) && property.format == SpecFormat::Bool
    {
        EntityPlatform::BinarySensor
    } else if property.readable() || property.notifiable() {
        EntityPlatform::Sensor
    } else {
        return None;
    };

    let mut claim = Claim::new(platform, MatchTier::Property, NodeKind::Property);
    if matches!(platform, EntityPlatform::Sensor | EntityPlatform::Number) {
        if let Some(display) = property.unit.as_deref().and_then(rules::display_unit) {
            claim = claim.with_display_unit(display);
        }
    }
    if platform == EntityPlatform::Sensor && claim.device_class.is_none() {
        if let Some(icon) = property.unit.as_deref().and_then(rules::unit_icon) {
            claim = claim.with_icon(icon);
        }
    }
    Some(claim)
}
