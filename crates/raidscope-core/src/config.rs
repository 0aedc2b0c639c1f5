//! Flat JSON configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::game::{
    DEFAULT_MAP_NAME, DEFAULT_MODULE_NAME, HIDEOUT_MAP_ID, ListSettings, SessionSettings,
    WATCHLIST_FILE, WORLD_OBJECT_NAME,
};
use crate::memory::layout::{limits, timing};
use crate::registry::WalkOptions;

/// Runtime configuration.
///
/// Every field has a default, so a partial file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Delay between poll ticks while attached
    pub poll_interval_ms: u64,
    /// Delay between attach attempts while the process is missing
    pub reattach_interval_ms: u64,
    /// Re-poll interval while the object registry is still populating
    pub registry_poll_ms: u64,
    /// Give up on a populating registry after this long
    pub registry_max_wait_ms: u64,
    pub position_refresh_cooldown_ms: u64,
    /// Consecutive refresh failures before an entity is rebuilt
    pub max_entity_errors: u32,
    /// Ticks an entity may be missing from the list before it is dropped
    pub max_missing_ticks: u32,
    pub module_name: String,
    pub world_object_name: String,
    pub hideout_map_id: String,
    pub default_map_name: String,
    pub watchlist_path: PathBuf,
    /// Reload the watchlist when the file changes
    pub watch_watchlist: bool,
    /// Include AI entities in entity listings
    pub show_ai: bool,
    /// Replace entity names with their category in listings
    pub hide_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        let list = ListSettings::default();
        Self {
            poll_interval_ms: timing::POLL_INTERVAL_MS,
            reattach_interval_ms: timing::REATTACH_INTERVAL_MS,
            registry_poll_ms: timing::REGISTRY_POLL_INTERVAL_MS,
            registry_max_wait_ms: timing::REGISTRY_MAX_WAIT_MS,
            position_refresh_cooldown_ms: timing::TRANSFORM_REFRESH_COOLDOWN_MS,
            max_entity_errors: list.max_errors,
            max_missing_ticks: list.max_missing_ticks,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            world_object_name: WORLD_OBJECT_NAME.to_string(),
            hideout_map_id: HIDEOUT_MAP_ID.to_string(),
            default_map_name: DEFAULT_MAP_NAME.to_string(),
            watchlist_path: PathBuf::from(WATCHLIST_FILE),
            watch_watchlist: true,
            show_ai: true,
            hide_names: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reattach_interval(&self) -> Duration {
        Duration::from_millis(self.reattach_interval_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            module_name: self.module_name.clone(),
            world_object_name: self.world_object_name.clone(),
            hideout_map_id: self.hideout_map_id.clone(),
            default_map_name: self.default_map_name.clone(),
            walk: WalkOptions {
                poll_interval: Duration::from_millis(self.registry_poll_ms),
                max_wait: Duration::from_millis(self.registry_max_wait_ms),
                max_nodes: limits::MAX_REGISTRY_NODES,
                name_len: limits::OBJECT_NAME_SIZE,
            },
            list: ListSettings {
                max_errors: self.max_entity_errors,
                max_missing_ticks: self.max_missing_ticks,
                position_cooldown: Duration::from_millis(self.position_refresh_cooldown_ms),
            },
        }
    }
}
