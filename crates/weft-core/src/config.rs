//! weft.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the weft daemon.
///
/// Every section is optional in the file; missing sections take the
/// defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeftConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    #[serde(default)]
    pub kv: KvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP edge listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    /// Directory files are resolved under.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// URL prefix identifying content-hashed build assets.
    #[serde(default = "default_assets_public_path")]
    pub assets_public_path: String,
    /// Fixed Cache-Control override. When set, it fully replaces the
    /// default prefix rule for every asset.
    pub cache_control: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvConfig {
    /// Directory holding the key/value store database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_port() -> u16 {
    8080
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_assets_public_path() -> String {
    "/build/".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            assets_public_path: default_assets_public_path(),
            cache_control: None,
        }
    }
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl WeftConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WeftConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
