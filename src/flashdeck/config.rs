use crate::error::Result;
use crate::subscriptions::FilterMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_UNKNOWN_CREATOR: &str = "Unknown";
const DEFAULT_DATA_FILE: &str = "flashdeck.json";
const DEFAULT_MIN_DISPLAY_NAME_LEN: usize = 3;

/// Configuration for flashdeck, stored in `config.json` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashdeckConfig {
    /// Creator name shown when a deck's owner has no profile
    #[serde(default = "default_unknown_creator")]
    pub unknown_creator: String,

    /// Filter mode the deck listing starts in
    #[serde(default)]
    pub default_filter: FilterMode,

    /// File name of the JSON document store, relative to the data directory
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Minimum length of a profile display name
    #[serde(default = "default_min_display_name_len")]
    pub min_display_name_len: usize,
}

fn default_unknown_creator() -> String {
    DEFAULT_UNKNOWN_CREATOR.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_min_display_name_len() -> usize {
    DEFAULT_MIN_DISPLAY_NAME_LEN
}

impl Default for FlashdeckConfig {
    fn default() -> Self {
        Self {
            unknown_creator: default_unknown_creator(),
            default_filter: FilterMode::default(),
            data_file: default_data_file(),
            min_display_name_len: DEFAULT_MIN_DISPLAY_NAME_LEN,
        }
    }
}

impl FlashdeckConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: FlashdeckConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }
}
