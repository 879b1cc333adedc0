use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ack::model::AckSettings;
use super::alerts::model::TriggerConfig;
use super::error::ConfigError;
use super::playback::model::{PlaybackPolicy, SignalConfig};
use super::playback::rodio_device::DeviceProfile;

/// Application settings, persisted as settings.json.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub playback: PlaybackPolicy,
    #[serde(default)]
    pub acknowledgment: AckSettings,
    /// Simulated ringer/volume state for the desktop sink
    #[serde(default)]
    pub device: DeviceProfile,
    /// argv template for placing calls; `{number}` is substituted
    #[serde(default)]
    pub dial_command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load settings, falling back to defaults if the file is missing or invalid.
    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!("Ignoring invalid {:?}: {}", self.config_path, e),
                },
                Err(e) => log::warn!("Could not read {:?}: {}", self.config_path, e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }
}
