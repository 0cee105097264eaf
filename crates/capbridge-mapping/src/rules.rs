//! Static capability-pattern tables.
//!
//! The matcher is data-driven: device templates describe whole-device
//! entities (climate, vacuum, ...), service templates describe single-service
//! entities (light, fan, switch), and the per-property override table plus
//! the unit/icon tables steer the tier-3 fallback. Names are the machine
//! names from the standard capability vocabulary.

use capbridge_core::node::{SpecAccess, SpecFormat};
use capbridge_core::platform::{DeviceClass, EntityPlatform, StateClass};

pub const RW: SpecAccess = SpecAccess::new(true, true, false);
pub const RO: SpecAccess = SpecAccess::new(true, false, false);
pub const WO: SpecAccess = SpecAccess::new(false, true, false);

/// A property a template requires, with the access modes it must offer.
#[derive(Debug, Clone, Copy)]
pub struct PropertyRule {
    pub name: &'static str,
    pub access: SpecAccess,
}

/// One service's shape inside a template: required properties with access
/// modes, optional property names (claimed when present, never required),
/// and required action names.
#[derive(Debug, Clone, Copy)]
pub struct ServiceRule {
    pub service: &'static str,
    pub required: &'static [PropertyRule],
    pub optional: &'static [&'static str],
    pub actions: &'static [&'static str],
}

/// Tier-1 pattern: a whole device classified as one composite entity.
#[derive(Debug, Clone, Copy)]
pub struct DeviceTemplate {
    pub platform: EntityPlatform,
    pub required: &'static [ServiceRule],
    pub optional: &'static [ServiceRule],
}

/// Tier-2 pattern: one service classified as one entity.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTemplate {
    pub platform: EntityPlatform,
    pub rule: ServiceRule,
}

/// Tier-3 per-name override, consulted before the generic ladder. `requires`
/// modes must all be present, `rejects` modes must all be absent, and the
/// declared format must be one of `formats`.
#[derive(Debug, Clone, Copy)]
pub struct PropertyOverride {
    pub name: &'static str,
    pub platform: EntityPlatform,
    pub requires: SpecAccess,
    pub rejects: SpecAccess,
    pub formats: &'static [SpecFormat],
    pub device_class: DeviceClass,
    pub state_class: Option<StateClass>,
    pub unit: Option<&'static str>,
}

const NUMERIC: &[SpecFormat] = &[SpecFormat::Float, SpecFormat::Integer];
const BOOLEAN: &[SpecFormat] = &[SpecFormat::Bool];

/// Rejection mask for the read-only overrides: any writable property fails.
const NO_WRITE: SpecAccess = SpecAccess::new(false, true, false);

pub const DEVICE_TEMPLATES: &[DeviceTemplate] = &[
    // Air conditioner: switch, mode and setpoint form the climate entity;
    // fan control and ambient readings fold in when present.
    DeviceTemplate {
        platform: EntityPlatform::Climate,
        required: &[ServiceRule {
            service: "air-conditioner",
            required: &[
                PropertyRule { name: "on", access: RW },
                PropertyRule { name: "mode", access: RW },
                PropertyRule { name: "target-temperature", access: RW },
            ],
            optional: &["eco", "heater", "dryer", "sleep-mode"],
            actions: &[],
        }],
        optional: &[
            ServiceRule {
                service: "fan-control",
                required: &[PropertyRule { name: "fan-level", access: RW }],
                optional: &["vertical-swing", "horizontal-swing"],
                actions: &[],
            },
            ServiceRule {
                service: "environment",
                required: &[PropertyRule { name: "temperature", access: RO }],
                optional: &["relative-humidity"],
                actions: &[],
            },
        ],
    },
    DeviceTemplate {
        platform: EntityPlatform::Climate,
        required: &[ServiceRule {
            service: "heater",
            required: &[
                PropertyRule { name: "on", access: RW },
                PropertyRule { name: "target-temperature", access: RW },
            ],
            optional: &["mode"],
            actions: &[],
        }],
        optional: &[ServiceRule {
            service: "environment",
            required: &[PropertyRule { name: "temperature", access: RO }],
            optional: &[],
            actions: &[],
        }],
    },
    DeviceTemplate {
        platform: EntityPlatform::Humidifier,
        required: &[ServiceRule {
            service: "humidifier",
            required: &[
                PropertyRule { name: "on", access: RW },
                PropertyRule { name: "target-humidity", access: RW },
            ],
            optional: &["mode", "fan-level"],
            actions: &[],
        }],
        optional: &[ServiceRule {
            service: "environment",
            required: &[PropertyRule { name: "relative-humidity", access: RO }],
            optional: &[],
            actions: &[],
        }],
    },
    DeviceTemplate {
        platform: EntityPlatform::Fan,
        required: &[ServiceRule {
            service: "air-purifier",
            required: &[
                PropertyRule { name: "on", access: RW },
                PropertyRule { name: "mode", access: RW },
            ],
            optional: &["fan-level", "favorite-level"],
            actions: &[],
        }],
        optional: &[
            ServiceRule {
                service: "environment",
                required: &[PropertyRule { name: "pm2.5-density", access: RO }],
                optional: &["temperature", "relative-humidity"],
                actions: &[],
            },
            ServiceRule {
                service: "filter",
                required: &[PropertyRule { name: "filter-life-level", access: RO }],
                optional: &[],
                actions: &[],
            },
        ],
    },
    DeviceTemplate {
        platform: EntityPlatform::Cover,
        required: &[ServiceRule {
            service: "curtain",
            required: &[PropertyRule { name: "motor-control", access: WO }],
            optional: &["current-position", "target-position", "status"],
            actions: &[],
        }],
        optional: &[],
    },
    DeviceTemplate {
        platform: EntityPlatform::WaterHeater,
        required: &[ServiceRule {
            service: "water-heater",
            required: &[
                PropertyRule { name: "on", access: RW },
                PropertyRule { name: "target-temperature", access: RW },
            ],
            optional: &["temperature", "mode"],
            actions: &[],
        }],
        optional: &[],
    },
    // Vacuums are driven by actions rather than writable properties.
    DeviceTemplate {
        platform: EntityPlatform::Vacuum,
        required: &[ServiceRule {
            service: "vacuum",
            required: &[PropertyRule { name: "status", access: RO }],
            optional: &["mode", "sweep-type"],
            actions: &["start-sweep", "stop-sweeping"],
        }],
        optional: &[ServiceRule {
            service: "battery",
            required: &[PropertyRule { name: "battery-level", access: RO }],
            optional: &[],
            actions: &[],
        }],
    },
];

pub const SERVICE_TEMPLATES: &[ServiceTemplate] = &[
    ServiceTemplate {
        platform: EntityPlatform::Light,
        rule: ServiceRule {
            service: "light",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &["brightness", "color-temperature", "color", "mode"],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Light,
        rule: ServiceRule {
            service: "indicator-light",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &["brightness", "mode"],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Fan,
        rule: ServiceRule {
            service: "fan",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &["fan-level", "mode", "horizontal-swing"],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Fan,
        rule: ServiceRule {
            service: "ceiling-fan",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &["fan-level"],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Switch,
        rule: ServiceRule {
            service: "switch",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &[],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Switch,
        rule: ServiceRule {
            service: "outlet",
            required: &[PropertyRule { name: "on", access: RW }],
            optional: &[],
            actions: &[],
        },
    },
    ServiceTemplate {
        platform: EntityPlatform::Cover,
        rule: ServiceRule {
            service: "curtain",
            required: &[PropertyRule { name: "motor-control", access: WO }],
            optional: &["current-position", "target-position"],
            actions: &[],
        },
    },
];

pub const PROPERTY_OVERRIDES: &[PropertyOverride] = &[
    PropertyOverride {
        name: "temperature",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Temperature,
        state_class: Some(StateClass::Measurement),
        unit: Some("°C"),
    },
    PropertyOverride {
        name: "relative-humidity",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Humidity,
        state_class: Some(StateClass::Measurement),
        unit: Some("%"),
    },
    PropertyOverride {
        name: "battery-level",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Battery,
        state_class: Some(StateClass::Measurement),
        unit: Some("%"),
    },
    PropertyOverride {
        name: "voltage",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Voltage,
        state_class: Some(StateClass::Measurement),
        unit: Some("V"),
    },
    PropertyOverride {
        name: "electric-current",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Current,
        state_class: Some(StateClass::Measurement),
        unit: Some("A"),
    },
    PropertyOverride {
        name: "power",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Power,
        state_class: Some(StateClass::Measurement),
        unit: Some("W"),
    },
    PropertyOverride {
        name: "electric-power",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Power,
        state_class: Some(StateClass::Measurement),
        unit: Some("W"),
    },
    PropertyOverride {
        name: "power-consumption",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Energy,
        state_class: Some(StateClass::TotalIncreasing),
        unit: Some("kWh"),
    },
    PropertyOverride {
        name: "illumination",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Illuminance,
        state_class: Some(StateClass::Measurement),
        unit: Some("lx"),
    },
    PropertyOverride {
        name: "pm2.5-density",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Pm25,
        state_class: Some(StateClass::Measurement),
        unit: Some("µg/m³"),
    },
    PropertyOverride {
        name: "co2-density",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Co2,
        state_class: Some(StateClass::Measurement),
        unit: Some("ppm"),
    },
    PropertyOverride {
        name: "atmospheric-pressure",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::Pressure,
        state_class: Some(StateClass::Measurement),
        unit: Some("Pa"),
    },
    PropertyOverride {
        name: "signal-strength",
        platform: EntityPlatform::Sensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: NUMERIC,
        device_class: DeviceClass::SignalStrength,
        state_class: Some(StateClass::Measurement),
        unit: Some("dBm"),
    },
    PropertyOverride {
        name: "contact-state",
        platform: EntityPlatform::BinarySensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: BOOLEAN,
        device_class: DeviceClass::Door,
        state_class: None,
        unit: None,
    },
    PropertyOverride {
        name: "motion-state",
        platform: EntityPlatform::BinarySensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: BOOLEAN,
        device_class: DeviceClass::Motion,
        state_class: None,
        unit: None,
    },
    PropertyOverride {
        name: "occupancy-status",
        platform: EntityPlatform::BinarySensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: BOOLEAN,
        device_class: DeviceClass::Occupancy,
        state_class: None,
        unit: None,
    },
    PropertyOverride {
        name: "submersion-state",
        platform: EntityPlatform::BinarySensor,
        requires: RO,
        rejects: NO_WRITE,
        formats: BOOLEAN,
        device_class: DeviceClass::Moisture,
        state_class: None,
        unit: None,
    },
];

/// Specification unit → display unit.
const DISPLAY_UNITS: &[(&str, &str)] = &[
    ("celsius", "°C"),
    ("fahrenheit", "°F"),
    ("kelvin", "K"),
    ("percentage", "%"),
    ("lux", "lx"),
    ("ppm", "ppm"),
    ("ppb", "ppb"),
    ("μg/m3", "µg/m³"),
    ("mg/m3", "mg/m³"),
    ("watt", "W"),
    ("volt", "V"),
    ("ampere", "A"),
    ("kWh", "kWh"),
    ("pascal", "Pa"),
    ("kilopascal", "kPa"),
    ("arcdegrees", "°"),
    ("seconds", "s"),
    ("minutes", "min"),
    ("hours", "h"),
    ("days", "d"),
];

/// Specification unit → default icon, used only when no device class already
/// implies one.
const UNIT_ICONS: &[(&str, &str)] = &[
    ("celsius", "mdi:thermometer"),
    ("fahrenheit", "mdi:thermometer"),
    ("kelvin", "mdi:thermometer"),
    ("percentage", "mdi:percent"),
    ("lux", "mdi:brightness-5"),
    ("ppm", "mdi:molecule"),
    ("μg/m3", "mdi:blur"),
    ("mg/m3", "mdi:blur"),
    ("watt", "mdi:flash"),
    ("volt", "mdi:flash-triangle"),
    ("ampere", "mdi:current-ac"),
    ("pascal", "mdi:gauge"),
    ("arcdegrees", "mdi:angle-acute"),
    ("seconds", "mdi:timer-outline"),
    ("minutes", "mdi:timer-outline"),
    ("hours", "mdi:timer-outline"),
];

pub fn property_override(name: &str) -> Option<&'static PropertyOverride> {
    PROPERTY_OVERRIDES.iter().find(|o| o.name == name)
}

pub fn display_unit(spec_unit: &str) -> Option<&'static str> {
    DISPLAY_UNITS
        .iter()
        .find(|(unit, _)| *unit == spec_unit)
        .map(|(_, display)| *display)
}

pub fn unit_icon(spec_unit: &str) -> Option<&'static str> {
    UNIT_ICONS
        .iter()
        .find(|(unit, _)| *unit == spec_unit)
        .map(|(_, icon)| *icon)
}

/// True when `access` offers every mode in `requires` and none in `rejects`.
pub fn access_permitted(access: &SpecAccess, requires: &SpecAccess, rejects: &SpecAccess) -> bool {
    access.contains(requires)
        && !((rejects.read && access.read)
            || (rejects.write && access.write)
            || (rejects.notify && access.notify))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: SpecAccess = SpecAccess::new(false, false, false);

    #[test]
    fn test_override_lookup() {
        let ov = property_override("temperature").unwrap();
        assert_eq!(ov.platform, EntityPlatform::Sensor);
        assert_eq!(ov.device_class, DeviceClass::Temperature);
        assert_eq!(ov.unit, Some("°C"));
        assert!(property_override("frobnicate").is_none());
    }

    #[test]
    fn test_unit_tables() {
        assert_eq!(display_unit("celsius"), Some("°C"));
        assert_eq!(display_unit("percentage"), Some("%"));
        assert_eq!(display_unit("parsec"), None);
        assert_eq!(unit_icon("celsius"), Some("mdi:thermometer"));
        assert_eq!(unit_icon("days"), None);
    }

    #[test]
    fn test_access_permitted() {
        let rw = SpecAccess::new(true, true, true);
        assert!(access_permitted(&rw, &RO, &NONE));
        // A writable property is rejected by the sensor mask.
        assert!(!access_permitted(&rw, &RO, &NO_WRITE));
        let ro = SpecAccess::new(true, false, true);
        assert!(access_permitted(&ro, &RO, &NO_WRITE));
        assert!(!access_permitted(&ro, &RW, &NONE));
    }

    #[test]
    fn test_templates_are_well_formed() {
        for template in DEVICE_TEMPLATES {
            assert!(!template.required.is_empty());
            for rule in template.required.iter().chain(template.optional) {
                assert!(!rule.service.is_empty());
                assert!(!rule.required.is_empty() || !rule.actions.is_empty());
            }
        }
        for template in SERVICE_TEMPLATES {
            assert!(!template.rule.required.is_empty());
        }
    }
}
