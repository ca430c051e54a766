//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that resolves configuration, loads
//! the compose file once, and hands the resulting registry to commands.
//!
//! # Example
//!
//! ```no_run
//! use stevedore::app::{App, LoadOptions};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::load(Path::new("."), &LoadOptions::default()).await?;
//!     println!("{} services", app.registry().len());
//!     Ok(())
//! }
//! ```

use crate::config::{StevedoreConfig, find_config_file};
use crate::error::{Error, Result};
use crate::registry::ServiceRegistry;
use crate::render::StyleSheet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Explicit paths given on the command line.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Compose file; overrides the configured one
    pub compose_file: Option<PathBuf>,

    /// Config file; disables the directory search
    pub config_file: Option<PathBuf>,
}

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    registry: ServiceRegistry,
    config: StevedoreConfig,
    compose_path: PathBuf,
}

impl App {
    /// Resolve configuration and load the compose file.
    ///
    /// The config file is the one given in `options`, else the nearest
    /// `stevedore.yaml` above `working_dir`, else the defaults. A compose
    /// path from the config is relative to the config file's directory; a
    /// compose path from `options` is relative to `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The compose file cannot be read
    /// - The compose file is not a valid service description
    pub async fn load(working_dir: &Path, options: &LoadOptions) -> Result<Self> {
        let config_path = match &options.config_file {
            Some(path) => Some(working_dir.join(path)),
            None => find_config_file(working_dir),
        };

        let (config, base_dir) = match config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                let config = StevedoreConfig::load(&path).await?;
                let base_dir = path
                    .parent()
                    .map_or_else(|| working_dir.to_path_buf(), Path::to_path_buf);
                (config, base_dir)
            }
            None => (StevedoreConfig::default(), working_dir.to_path_buf()),
        };

        let compose_path = match &options.compose_file {
            Some(path) => working_dir.join(path),
            None => base_dir.join(&config.compose_file),
        };

        tracing::debug!(path = %compose_path.display(), "Loading compose file");
        let content = fs::read_to_string(&compose_path).await.map_err(|e| {
            Error::Config(format!(
                "Cannot read compose file '{}': {e}",
                compose_path.display()
            ))
        })?;
        let registry = ServiceRegistry::from_yaml_str(&content)?;

        Ok(Self {
            registry,
            config,
            compose_path,
        })
    }

    /// Build a context around an already decoded registry.
    pub fn from_registry(registry: ServiceRegistry, config: StevedoreConfig) -> Self {
        Self {
            registry,
            config,
            compose_path: PathBuf::new(),
        }
    }

    /// The loaded services.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &StevedoreConfig {
        &self.config
    }

    /// Display styles from the configuration.
    pub fn style_sheet(&self) -> StyleSheet {
        self.config.style_sheet()
    }

    /// Path of the compose file that was loaded.
    pub fn compose_path(&self) -> &Path {
        &self.compose_path
    }
}
