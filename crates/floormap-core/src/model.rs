//! Floor map data model types.
//!
//! These types describe what gets persisted and exchanged:
//! - Sensor kinds available in the palette
//! - Markers placed on the floor plan
//! - The map configuration record (floor plan + markers)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zone filter value that matches every zone.
pub const ALL_ZONES: &str = "all";

/// Fixed zone list. The first entry receives markers created while the
/// filter is set to [`ALL_ZONES`].
pub const ZONES: [&str; 4] = ["Zone1", "Zone2", "Zone3", "Zone4"];

/// Kind of sensor a marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Light,
    LedRgb,
}

/// Measurement range advertised for a sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementRange {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl SensorKind {
    /// Palette order.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Light,
        SensorKind::LedRgb,
    ];

    /// Wire name, also used as the prefix of default marker names.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Light => "light",
            SensorKind::LedRgb => "led_rgb",
        }
    }

    /// Short label drawn inside the marker.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "T",
            SensorKind::Humidity => "H",
            SensorKind::Light => "L",
            SensorKind::LedRgb => "RGB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Humidity => "Humidity",
            SensorKind::Light => "Light",
            SensorKind::LedRgb => "LED RGB",
        }
    }

    pub fn measurement_range(&self) -> MeasurementRange {
        match self {
            SensorKind::Temperature => MeasurementRange {
                min: -40.0,
                max: 125.0,
                unit: "°C",
            },
            SensorKind::Humidity => MeasurementRange {
                min: 0.0,
                max: 100.0,
                unit: "%",
            },
            SensorKind::Light => MeasurementRange {
                min: 0.0,
                max: 65535.0,
                unit: "lux",
            },
            SensorKind::LedRgb => MeasurementRange {
                min: 0.0,
                max: 255.0,
                unit: "PWM",
            },
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sensor kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sensor kind: {0}")]
pub struct UnknownSensorKind(pub String);

impl FromStr for SensorKind {
    type Err = UnknownSensorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSensorKind(s.to_string()))
    }
}

/// A sensor marker placed on the floor plan.
///
/// `x` and `y` are percentages of the rendered floor plan's bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedSensor {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: SensorKind,

    pub x: f64,
    pub y: f64,

    pub zone: String,
    pub name: String,
}

/// The persisted floor map configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /// Background image as a data URL. Empty means no image loaded.
    #[serde(default)]
    pub floor_plan_url: String,

    /// Markers in creation order.
    pub sensors: Vec<PlacedSensor>,
}

impl MapConfig {
    pub fn has_floor_plan(&self) -> bool {
        !self.floor_plan_url.is_empty()
    }

    pub fn sensor(&self, id: &str) -> Option<&PlacedSensor> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn sensor_mut(&mut self, id: &str) -> Option<&mut PlacedSensor> {
        self.sensors.iter_mut().find(|s| s.id == id)
    }
}

/// Returns true for [`ALL_ZONES`] or any entry of [`ZONES`].
pub fn is_known_zone_filter(zone: &str) -> bool {
    zone == ALL_ZONES || ZONES.contains(&zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&SensorKind::LedRgb).unwrap(),
            "\"led_rgb\""
        );
        let kind: SensorKind = serde_json::from_str("\"humidity\"").unwrap();
        assert_eq!(kind, SensorKind::Humidity);
        assert!(serde_json::from_str::<SensorKind>("\"pressure\"").is_err());
    }

    #[test]
    fn test_sensor_kind_from_str() {
        for kind in SensorKind::ALL {
            assert_eq!(kind.as_str().parse::<SensorKind>().unwrap(), kind);
        }
        assert_eq!(
            "Temperature".parse::<SensorKind>(),
            Err(UnknownSensorKind("Temperature".to_string()))
        );
    }

    #[test]
    fn test_placed_sensor_serialization() {
        let sensor = PlacedSensor {
            id: "abc".to_string(),
            kind: SensorKind::Temperature,
            x: 12.5,
            y: 40.0,
            zone: "Zone1".to_string(),
            name: "temperature_1".to_string(),
        };
        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["type"], "temperature");
        assert_eq!(json["x"], 12.5);
        assert_eq!(json["zone"], "Zone1");
    }

    #[test]
    fn test_map_config_camel_case() {
        let config = MapConfig {
            floor_plan_url: "data:image/png;base64,AAAA".to_string(),
            sensors: vec![],
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["floorPlanUrl"], "data:image/png;base64,AAAA");
        assert!(json["sensors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_zone_filters() {
        assert!(is_known_zone_filter("all"));
        assert!(is_known_zone_filter("Zone3"));
        assert!(!is_known_zone_filter("zone3"));
        assert!(!is_known_zone_filter(""));
    }
}
