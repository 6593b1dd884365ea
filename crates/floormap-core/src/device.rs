//! Device sensor mapping.
//!
//! Describes which sensors are wired to a microcontroller board and through
//! which pins, together with each sensor's measurement range and the
//! board's reporting intervals. [`DeviceMapper`] is the controller around a
//! [`DeviceConfig`], persisted through the same [`ConfigStorage`] as the
//! floor map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, CodecError};
use crate::config::{self, ConfigStorage};
use crate::editor::{EditorError, ExportFile};
use crate::model::SensorKind;
use crate::notification::Notification;

/// Storage key of the device configuration.
pub const DEVICE_CONFIG_KEY: &str = "deviceSensorConfig";

/// Accepted interval values, in the interval's own unit.
pub const INTERVAL_RANGE: RangeInclusive<u32> = 1..=3600;

const ESP8266_PINS: &[&str] = &[
    "D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7", "D8", "3V3", "GND",
];

const ESP32_PINS: &[&str] = &[
    "GPIO0", "GPIO1", "GPIO2", "GPIO3", "GPIO4", "GPIO5", "GPIO12", "GPIO13", "GPIO14", "GPIO15",
    "GPIO16", "GPIO17", "3V3", "GND",
];

/// Errors from device configuration edits and validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("No sensor at index {0}")]
    NoSuchSensor(usize),

    #[error("Sensor {sensor} has no pin at index {pin}")]
    NoSuchPin { sensor: usize, pin: usize },

    #[error("Pin {pin} does not exist on {device}")]
    UnknownPin { pin: String, device: DeviceType },

    #[error("Interval {0} is outside 1..=3600")]
    IntervalOutOfRange(u32),

    #[error("Invalid measurement range {min}..{max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid error margin {0}")]
    InvalidErrorMargin(f64),
}

/// Supported boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceType {
    #[default]
    #[serde(rename = "ESP8266_D1_MINI")]
    Esp8266D1Mini,
    #[serde(rename = "ESP32_NANO")]
    Esp32Nano,
}

impl DeviceType {
    pub const ALL: [DeviceType; 2] = [DeviceType::Esp8266D1Mini, DeviceType::Esp32Nano];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Esp8266D1Mini => "ESP8266_D1_MINI",
            DeviceType::Esp32Nano => "ESP32_NANO",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceType::Esp8266D1Mini => "ESP8266 D1 Mini",
            DeviceType::Esp32Nano => "ESP32 Nano",
        }
    }

    /// Pins a sensor pin can be wired to.
    pub fn pins(&self) -> &'static [&'static str] {
        match self {
            DeviceType::Esp8266D1Mini => ESP8266_PINS,
            DeviceType::Esp32Nano => ESP32_PINS,
        }
    }

    pub fn has_pin(&self, pin: &str) -> bool {
        self.pins().contains(&pin)
    }

    /// Pinout reference for the board.
    pub fn datasheet_url(&self) -> &'static str {
        match self {
            DeviceType::Esp8266D1Mini => "https://www.wemos.cc/en/latest/d1/d1_mini.html",
            DeviceType::Esp32Nano => "https://docs.espressif.com/projects/esp-idf/en/latest/esp32/hw-reference/esp32/get-started-devkitc.html",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sensor pin and the board pin it is wired to. An empty `device_pin`
/// means not wired yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMapping {
    pub sensor_pin: String,
    pub device_pin: String,
}

impl PinMapping {
    fn unassigned(sensor_pin: &str) -> Self {
        Self {
            sensor_pin: sensor_pin.to_string(),
            device_pin: String::new(),
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.device_pin.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

/// A sensor attached to the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSensor {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub name: String,
    pub pin_mappings: Vec<PinMapping>,
    pub measurement_range: SensorRange,
    pub error_margin: f64,
    #[serde(default)]
    pub datasheet_url: String,
}

impl DeviceSensor {
    /// A sensor of `kind` with its catalog range, error margin and pins.
    pub fn with_defaults(kind: SensorKind, name: impl Into<String>) -> Self {
        let range = kind.measurement_range();
        Self {
            kind,
            name: name.into(),
            pin_mappings: sensor_pins(kind)
                .iter()
                .map(|pin| PinMapping::unassigned(pin))
                .collect(),
            measurement_range: SensorRange {
                min: range.min,
                max: range.max,
                unit: range.unit.to_string(),
            },
            error_margin: default_error_margin(kind),
            datasheet_url: String::new(),
        }
    }
}

/// Pins exposed by each sensor kind, in wiring order.
pub fn sensor_pins(kind: SensorKind) -> &'static [&'static str] {
    match kind {
        SensorKind::Temperature | SensorKind::Humidity => &["VCC", "DATA", "GND"],
        SensorKind::Light => &["VCC", "OUT", "GND"],
        SensorKind::LedRgb => &["R", "G", "B", "VCC", "GND"],
    }
}

pub fn default_error_margin(kind: SensorKind) -> f64 {
    match kind {
        SensorKind::Temperature => 0.5,
        SensorKind::Humidity => 2.0,
        SensorKind::Light => 5.0,
        SensorKind::LedRgb => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    #[default]
    Seconds,
    Minutes,
}

/// A reporting interval as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub value: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn seconds(value: u32) -> Self {
        Self {
            value,
            unit: IntervalUnit::Seconds,
        }
    }

    pub fn minutes(value: u32) -> Self {
        Self {
            value,
            unit: IntervalUnit::Minutes,
        }
    }

    pub fn as_duration(&self) -> Duration {
        let secs = u64::from(self.value);
        match self.unit {
            IntervalUnit::Seconds => Duration::from_secs(secs),
            IntervalUnit::Minutes => Duration::from_secs(secs * 60),
        }
    }

    fn check(&self) -> Result<(), DeviceError> {
        if INTERVAL_RANGE.contains(&self.value) {
            Ok(())
        } else {
            Err(DeviceError::IntervalOutOfRange(self.value))
        }
    }
}

/// Full configuration of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub device_type: DeviceType,
    pub device_id: String,
    pub device_name: String,
    pub sensors: Vec<DeviceSensor>,
    pub data_send_interval: Interval,
    pub heartbeat_interval: Interval,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::default(),
            device_id: String::new(),
            device_name: String::new(),
            sensors: Vec::new(),
            data_send_interval: Interval::seconds(30),
            heartbeat_interval: Interval::seconds(60),
        }
    }
}

impl DeviceConfig {
    /// Append a sensor with catalog defaults and return its index.
    ///
    /// Names follow `"<Kind> Sensor <n>"` with `n` the sensor count after
    /// insertion.
    pub fn add_sensor(&mut self, kind: SensorKind) -> usize {
        let name = format!("{} Sensor {}", kind.display_name(), self.sensors.len() + 1);
        self.sensors.push(DeviceSensor::with_defaults(kind, name));
        self.sensors.len() - 1
    }

    pub fn sensor(&self, index: usize) -> Result<&DeviceSensor, DeviceError> {
        self.sensors.get(index).ok_or(DeviceError::NoSuchSensor(index))
    }

    fn sensor_mut(&mut self, index: usize) -> Result<&mut DeviceSensor, DeviceError> {
        self.sensors
            .get_mut(index)
            .ok_or(DeviceError::NoSuchSensor(index))
    }

    pub fn remove_sensor(&mut self, index: usize) -> Result<DeviceSensor, DeviceError> {
        if index >= self.sensors.len() {
            return Err(DeviceError::NoSuchSensor(index));
        }
        Ok(self.sensors.remove(index))
    }

    pub fn rename_sensor(&mut self, index: usize, name: &str) -> Result<(), DeviceError> {
        self.sensor_mut(index)?.name = name.to_string();
        Ok(())
    }

    pub fn set_measurement_range(
        &mut self,
        index: usize,
        range: SensorRange,
    ) -> Result<(), DeviceError> {
        check_range(&range)?;
        self.sensor_mut(index)?.measurement_range = range;
        Ok(())
    }

    pub fn set_error_margin(&mut self, index: usize, margin: f64) -> Result<(), DeviceError> {
        check_margin(margin)?;
        self.sensor_mut(index)?.error_margin = margin;
        Ok(())
    }

    pub fn set_datasheet_url(&mut self, index: usize, url: &str) -> Result<(), DeviceError> {
        self.sensor_mut(index)?.datasheet_url = url.trim().to_string();
        Ok(())
    }

    /// Wire a sensor pin to a board pin. An empty `device_pin` unwires it.
    pub fn assign_pin(
        &mut self,
        sensor: usize,
        pin: usize,
        device_pin: &str,
    ) -> Result<(), DeviceError> {
        let device = self.device_type;
        if !device_pin.is_empty() && !device.has_pin(device_pin) {
            return Err(DeviceError::UnknownPin {
                pin: device_pin.to_string(),
                device,
            });
        }
        let mapping = self
            .sensor_mut(sensor)?
            .pin_mappings
            .get_mut(pin)
            .ok_or(DeviceError::NoSuchPin { sensor, pin })?;
        mapping.device_pin = device_pin.to_string();
        Ok(())
    }

    /// Switch boards. Mappings to pins the new board lacks are unwired;
    /// returns how many.
    pub fn set_device_type(&mut self, device_type: DeviceType) -> usize {
        self.device_type = device_type;
        let mut cleared = 0;
        for mapping in self.sensors.iter_mut().flat_map(|s| s.pin_mappings.iter_mut()) {
            if mapping.is_assigned() && !device_type.has_pin(&mapping.device_pin) {
                mapping.device_pin.clear();
                cleared += 1;
            }
        }
        cleared
    }

    pub fn set_data_send_interval(&mut self, interval: Interval) -> Result<(), DeviceError> {
        interval.check()?;
        self.data_send_interval = interval;
        Ok(())
    }

    pub fn set_heartbeat_interval(&mut self, interval: Interval) -> Result<(), DeviceError> {
        interval.check()?;
        self.heartbeat_interval = interval;
        Ok(())
    }

    /// Sensor pins not wired yet, as `(sensor index, sensor pin)`.
    pub fn unassigned_pins(&self) -> Vec<(usize, &str)> {
        self.sensors
            .iter()
            .enumerate()
            .flat_map(|(i, s)| {
                s.pin_mappings
                    .iter()
                    .filter(|m| !m.is_assigned())
                    .map(move |m| (i, m.sensor_pin.as_str()))
            })
            .collect()
    }

    /// Check what typed deserialization cannot express.
    pub fn validate(&self) -> Result<(), DeviceError> {
        self.data_send_interval.check()?;
        self.heartbeat_interval.check()?;
        for sensor in &self.sensors {
            check_range(&sensor.measurement_range)?;
            check_margin(sensor.error_margin)?;
            for mapping in &sensor.pin_mappings {
                if mapping.is_assigned() && !self.device_type.has_pin(&mapping.device_pin) {
                    return Err(DeviceError::UnknownPin {
                        pin: mapping.device_pin.clone(),
                        device: self.device_type,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_range(range: &SensorRange) -> Result<(), DeviceError> {
    if range.min.is_finite() && range.max.is_finite() && range.min <= range.max {
        Ok(())
    } else {
        Err(DeviceError::InvalidRange {
            min: range.min,
            max: range.max,
        })
    }
}

fn check_margin(margin: f64) -> Result<(), DeviceError> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(())
    } else {
        Err(DeviceError::InvalidErrorMargin(margin))
    }
}

/// Encode a device configuration as pretty-printed JSON.
pub fn export_device_config(config: &DeviceConfig) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(config).map_err(CodecError::Serialize)
}

/// Decode and validate a device configuration.
pub fn import_device_config(bytes: &[u8]) -> Result<DeviceConfig, CodecError> {
    let config: DeviceConfig = codec::decode(bytes)?;
    config
        .validate()
        .map_err(|e| CodecError::Schema(e.to_string()))?;
    Ok(config)
}

/// File name offered for an export: `device-config-<id>.json`, or
/// `unnamed` without an id. Characters unsafe in a file name become `_`.
pub fn device_export_file_name(device_id: &str) -> String {
    let id = device_id.trim();
    if id.is_empty() {
        return "device-config-unnamed.json".to_string();
    }
    let safe: String = id
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("device-config-{}.json", safe)
}

// ============================================================================
// Controller
// ============================================================================

/// Device configuration controller with persistence and notifications.
pub struct DeviceMapper<S: ConfigStorage> {
    storage: S,
    storage_key: String,
    config: DeviceConfig,
    dirty: bool,
    notifications: Vec<Notification>,
}

impl<S: ConfigStorage> DeviceMapper<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEVICE_CONFIG_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: key.into(),
            config: DeviceConfig::default(),
            dirty: false,
            notifications: Vec::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn available_pins(&self) -> &'static [&'static str] {
        self.config.device_type.pins()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn set_device_id(&mut self, id: &str) {
        self.config.device_id = id.trim().to_string();
        self.dirty = true;
    }

    pub fn set_device_name(&mut self, name: &str) {
        self.config.device_name = name.to_string();
        self.dirty = true;
    }

    pub fn set_device_type(&mut self, device_type: DeviceType) -> usize {
        let cleared = self.config.set_device_type(device_type);
        if cleared > 0 {
            self.notify(Notification::info(
                "Pins cleared",
                format!("{} pin mapping(s) do not exist on {}", cleared, device_type.display_name()),
            ));
        }
        self.dirty = true;
        cleared
    }

    pub fn add_sensor(&mut self, kind: SensorKind) -> usize {
        let index = self.config.add_sensor(kind);
        debug!(kind = %kind, index, "Sensor added to device");
        self.dirty = true;
        index
    }

    pub fn remove_sensor(&mut self, index: usize) -> Result<DeviceSensor, DeviceError> {
        let removed = self.config.remove_sensor(index)?;
        self.dirty = true;
        Ok(removed)
    }

    pub fn rename_sensor(&mut self, index: usize, name: &str) -> Result<(), DeviceError> {
        self.edit(|config| config.rename_sensor(index, name))
    }

    pub fn set_measurement_range(
        &mut self,
        index: usize,
        range: SensorRange,
    ) -> Result<(), DeviceError> {
        self.edit(|config| config.set_measurement_range(index, range))
    }

    pub fn set_error_margin(&mut self, index: usize, margin: f64) -> Result<(), DeviceError> {
        self.edit(|config| config.set_error_margin(index, margin))
    }

    pub fn set_datasheet_url(&mut self, index: usize, url: &str) -> Result<(), DeviceError> {
        self.edit(|config| config.set_datasheet_url(index, url))
    }

    pub fn assign_pin(
        &mut self,
        sensor: usize,
        pin: usize,
        device_pin: &str,
    ) -> Result<(), DeviceError> {
        self.edit(|config| config.assign_pin(sensor, pin, device_pin))
    }

    pub fn set_data_send_interval(&mut self, interval: Interval) -> Result<(), DeviceError> {
        self.edit(|config| config.set_data_send_interval(interval))
    }

    pub fn set_heartbeat_interval(&mut self, interval: Interval) -> Result<(), DeviceError> {
        self.edit(|config| config.set_heartbeat_interval(interval))
    }

    /// Persist the configuration, overwriting any previous save.
    pub fn save(&mut self) -> Result<(), EditorError> {
        match config::save_value(&self.storage, &self.storage_key, &self.config) {
            Ok(()) => {
                info!(key = %self.storage_key, sensors = self.config.sensors.len(), "Device configuration saved");
                self.dirty = false;
                self.notify(Notification::success("Saved", "Device configuration saved"));
                Ok(())
            }
            Err(e) => Err(self.fail("Save failed", e.into())),
        }
    }

    /// Restore the persisted configuration. On any failure the current
    /// configuration is kept.
    pub fn load(&mut self) -> Result<(), EditorError> {
        let loaded = self
            .storage
            .read(&self.storage_key)
            .map_err(EditorError::from)
            .and_then(|json| Ok(import_device_config(json.as_bytes())?));
        match loaded {
            Ok(config) => {
                info!(key = %self.storage_key, sensors = config.sensors.len(), "Device configuration loaded");
                self.config = config;
                self.dirty = false;
                self.notify(Notification::success("Loaded", "Device configuration loaded"));
                Ok(())
            }
            Err(EditorError::NotFound(key)) => {
                self.notify(Notification::info(
                    "Nothing saved",
                    "No saved device configuration found",
                ));
                Err(EditorError::NotFound(key))
            }
            Err(e) => Err(self.fail("Load failed", e)),
        }
    }

    /// Export as a named file for download.
    pub fn export_download(&mut self) -> Result<ExportFile, EditorError> {
        match export_device_config(&self.config) {
            Ok(bytes) => {
                let file_name = device_export_file_name(&self.config.device_id);
                self.notify(Notification::success("Exported", file_name.clone()));
                Ok(ExportFile { file_name, bytes })
            }
            Err(e) => Err(self.fail("Export failed", e.into())),
        }
    }

    /// Replace the whole configuration with an imported one.
    pub fn import_config(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        match import_device_config(bytes) {
            Ok(imported) => {
                info!(sensors = imported.sensors.len(), "Device configuration imported");
                self.config = imported;
                self.dirty = true;
                self.notify(Notification::success("Imported", "Device configuration imported"));
                Ok(())
            }
            Err(e) => Err(self.fail("Import failed", e.into())),
        }
    }

    fn edit<F>(&mut self, op: F) -> Result<(), DeviceError>
    where
        F: FnOnce(&mut DeviceConfig) -> Result<(), DeviceError>,
    {
        op(&mut self.config)?;
        self.dirty = true;
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn fail(&mut self, title: &str, err: EditorError) -> EditorError {
        warn!("{}: {}", title, err);
        self.notify(Notification::error(title, err.to_string()));
        err
    }
}
