//! Bot configuration loaded from a TOML file.
//!
//! ```toml
//! [general]
//! nick = "wtf"
//! db_path = "wtf.db"
//! lookup_limit = 25   # 0 = unbounded
//!
//! [gateway]
//! bind_addr = "127.0.0.1:8833"
//! shared_secret = "..."
//! outbound_url = "http://127.0.0.1:9000/outbound"
//!
//! [rooms]
//! test = ""
//! private = "hunter2"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WtfError, WtfResult};
use crate::interpreter::{DEFAULT_COMMAND, DEFAULT_LOOKUP_LIMIT};
use crate::store::LookupLimit;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WtfConfig {
    pub general: GeneralConfig,
    pub gateway: GatewaySettings,
    /// Room name to optional password. Empty admits every room.
    pub rooms: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    pub nick: String,
    pub db_path: PathBuf,
    pub command: String,
    pub lookup_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            nick: "wtf".to_string(),
            db_path: PathBuf::from("wtf.db"),
            command: DEFAULT_COMMAND.to_string(),
            lookup_limit: DEFAULT_LOOKUP_LIMIT,
        }
    }
}

impl GeneralConfig {
    pub fn lookup_limit(&self) -> LookupLimit {
        match self.lookup_limit {
            0 => None,
            n => Some(n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewaySettings {
    pub bind_addr: String,
    pub outbound_url: Option<String>,
    pub shared_secret: Option<String>,
    pub min_send_interval_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8833".to_string(),
            outbound_url: None,
            shared_secret: None,
            min_send_interval_ms: 0,
        }
    }
}

impl WtfConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> WtfResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            WtfError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            WtfError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    pub fn room_names(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }
}
