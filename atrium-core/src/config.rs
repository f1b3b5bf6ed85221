//! Configuration type definitions and loading
//!
//! These types represent the runtime configuration for Atrium. A
//! configuration file (JSON or TOML) and the CLI flags both deserialize
//! into [`ServerConfig`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Root directory to serve
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Index file to look for in directories
    #[serde(default = "default_index")]
    pub index: String,

    /// Enable auto-generated directory listings
    #[serde(default)]
    pub auto_index: bool,

    /// Hide files and directories whose name starts with a dot
    #[serde(default = "default_true")]
    pub hide_dotfiles: bool,

    /// Enable response compression
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Basic auth realm
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Inline credential lines (user:bcrypt-hash), overriding the file
    #[serde(default)]
    pub auth: Option<String>,

    /// Path to an htpasswd-style credential file (user:bcrypt-hash lines)
    #[serde(default)]
    pub auth_file: Option<PathBuf>,

    /// Literal path prefix to strip from every request
    #[serde(default)]
    pub strip_prefix: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_index() -> String {
    "index.html".to_string()
}

fn default_realm() -> String {
    "atrium".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            root: default_root(),
            index: default_index(),
            auto_index: false,
            hide_dotfiles: true,
            compress: true,
            realm: default_realm(),
            auth: None,
            auth_file: None,
            strip_prefix: None,
        }
    }
}

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(Error::Config(format!("Unknown config format: {}", ext))),
        }
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<ServerConfig> {
        serde_json::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<ServerConfig> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}
