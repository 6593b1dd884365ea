//! Server settings.
//!
//! Settings come from a JSON file (`$FLOORMAP_SETTINGS`, or `floormap.json`
//! in the working directory when present). Every field is optional; missing
//! values fall back to defaults. `FLOORMAP_BIND` and `FLOORMAP_DATA_DIR`
//! override the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_DATA_DIR: &str = "./data/maps";
pub const DEFAULT_LOG_FILTER: &str = "info,floormap_web=debug";
const DEFAULT_SETTINGS_FILE: &str = "floormap.json";

/// Settings as written in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// Address to listen on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Directory holding one JSON file per facility map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Name reported by the discovery endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Tracing filter used when `RUST_LOG` is not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

/// Settings with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub name: String,
    pub log_filter: String,
}

impl ServerSettings {
    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Locate and read the settings file. Absence of the default file is
    /// not an error; absence of an explicitly named one is.
    pub fn discover(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(&path),
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment overrides given as `(bind, data_dir)`.
    pub fn with_overrides(mut self, bind: Option<String>, data_dir: Option<String>) -> Self {
        if let Some(bind) = bind {
            self.bind = Some(bind);
        }
        if let Some(dir) = data_dir {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn resolve(self) -> anyhow::Result<ResolvedSettings> {
        let bind = self.bind.as_deref().unwrap_or(DEFAULT_BIND);
        Ok(ResolvedSettings {
            bind: bind
                .parse()
                .with_context(|| format!("invalid bind address {:?}", bind))?,
            data_dir: self
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            name: self.name.unwrap_or_else(|| "floormap-server".to_string()),
            log_filter: self
                .log_filter
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}
