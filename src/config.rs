use std::io;

use serde::Deserialize;

use crate::artifact_io::load_merged_config_text;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub downloads: DownloadsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    pub dir: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            downloads: DownloadsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: "~/.qa-console/scripts".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Reads the merged on-disk configuration (defaults plus user overrides).
    pub fn load() -> io::Result<Self> {
        let text = load_merged_config_text()?;
        Self::from_toml_str(&text).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
