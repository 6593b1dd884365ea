//! # floormap-core
//!
//! Floor map sensor placement, independent of any UI or HTTP framework.
//!
//! This crate provides:
//! - Data model types (SensorKind, PlacedSensor, MapConfig)
//! - The map editor state controller
//! - Configuration storage abstraction with memory and file backends
//! - JSON export/import with validation
//! - Floor plan image decoding to data URLs
//! - Device sensor pin mapping (boards, pins, reporting intervals)
//!
//! This crate contains no async code, so the editor can be driven from a
//! UI event loop and the storage shared with an async HTTP service alike.

pub mod codec;
pub mod config;
pub mod device;
pub mod editor;
pub mod floor_plan;
pub mod model;
pub mod notification;
pub mod viewport;

pub use codec::CodecError;
pub use config::{
    ConfigError, ConfigStorage, FacilityMaps, FileConfigStorage, MemoryConfigStorage,
    MAP_CONFIG_KEY,
};
pub use device::{
    DeviceConfig, DeviceError, DeviceMapper, DeviceSensor, DeviceType, Interval, IntervalUnit,
    PinMapping, SensorRange, DEVICE_CONFIG_KEY,
};
pub use editor::{DragIntent, DropOutcome, EditorError, ExportFile, MapEditor};
pub use floor_plan::DecodeError;
pub use model::*;
pub use notification::{Notification, Severity};
pub use viewport::{Bounds, Point, Viewport};
