//! Configuration management for stevedore.
//!
//! Configuration is optional. When present it lives in `stevedore.yaml`,
//! found by searching from the working directory up towards the filesystem
//! root:
//!
//! ```yaml
//! compose-file: docker-compose.yml
//! styles:
//!   application:
//!     color: green
//!     size: 1200
//! ```

use crate::error::{Error, Result};
use crate::render::{NodeStyle, StyleSheet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "stevedore.yaml";

/// Compose file read when neither the command line nor the config names one
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Maximum directory depth to traverse when searching for a config file
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure for stevedore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StevedoreConfig {
    /// Compose file to load, relative to the config file's directory
    #[serde(default = "default_compose_file")]
    pub compose_file: PathBuf,

    /// Display styles by service kind, applied over the built-in ones
    #[serde(default)]
    pub styles: BTreeMap<String, NodeStyle>,
}

fn default_compose_file() -> PathBuf {
    PathBuf::from(DEFAULT_COMPOSE_FILE)
}

impl Default for StevedoreConfig {
    fn default() -> Self {
        Self {
            compose_file: default_compose_file(),
            styles: BTreeMap::new(),
        }
    }
}

impl StevedoreConfig {
    /// Parse configuration from YAML text.
    ///
    /// An empty document is the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not a valid configuration.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// The style sheet described by this configuration.
    pub fn style_sheet(&self) -> StyleSheet {
        StyleSheet::with_overrides(&self.styles)
    }
}

/// Find the nearest config file by searching up the directory tree.
///
/// Starts from the given directory and traverses parent directories until a
/// `stevedore.yaml` is found, the root is reached, or the maximum traversal
/// depth is exceeded.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
