//! Target platform vocabulary for the mapping engine.
//!
//! These enums name the home-automation surface a capability node can be
//! projected onto. They deliberately stay platform-agnostic strings on the
//! wire (snake_case) so a claim map can be serialized for diagnostics.

use serde::{Deserialize, Serialize};

/// Entity platform a node can be claimed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPlatform {
    Sensor,
    BinarySensor,
    Switch,
    Select,
    Number,
    Text,
    Button,
    Climate,
    Fan,
    Light,
    Cover,
    Humidifier,
    Vacuum,
    WaterHeater,
}

impl EntityPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Switch => "switch",
            Self::Select => "select",
            Self::Number => "number",
            Self::Text => "text",
            Self::Button => "button",
            Self::Climate => "climate",
            Self::Fan => "fan",
            Self::Light => "light",
            Self::Cover => "cover",
            Self::Humidifier => "humidifier",
            Self::Vacuum => "vacuum",
            Self::WaterHeater => "water_heater",
        }
    }

    /// Whether the platform represents a grouped multi-node entity rather
    /// than a single-property one.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Climate
                | Self::Fan
                | Self::Light
                | Self::Cover
                | Self::Humidifier
                | Self::Vacuum
                | Self::WaterHeater
        )
    }
}

impl std::fmt::Display for EntityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic class attached to sensor-like claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    // Measurement classes.
    Temperature,
    Humidity,
    Battery,
    Power,
    Energy,
    Voltage,
    Current,
    Illuminance,
    Pm25,
    #[serde(rename = "carbon_dioxide")]
    Co2,
    Pressure,
    SignalStrength,
    // Binary classes.
    Door,
    Motion,
    Occupancy,
    Smoke,
    Moisture,
    Plug,
    Problem,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Battery => "battery",
            Self::Power => "power",
            Self::Energy => "energy",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Illuminance => "illuminance",
            Self::Pm25 => "pm25",
            Self::Co2 => "carbon_dioxide",
            Self::Pressure => "pressure",
            Self::SignalStrength => "signal_strength",
            Self::Door => "door",
            Self::Motion => "motion",
            Self::Occupancy => "occupancy",
            Self::Smoke => "smoke",
            Self::Moisture => "moisture",
            Self::Plug => "plug",
            Self::Problem => "problem",
        }
    }
}

/// Statistics class for numeric sensor claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

impl StateClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Measurement => "measurement",
            Self::Total => "total",
            Self::TotalIncreasing => "total_increasing",
        }
    }
}
