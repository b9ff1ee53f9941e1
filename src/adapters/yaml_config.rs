//! YAML file configuration adapter.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::{CompanionConfig, ConfigTree};
use crate::error::ConfigError;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// [`ConfigPort`] reading one YAML file.
///
/// A missing file is not an error: every key takes its default.
#[derive(Debug, Clone)]
pub struct YamlConfigAdapter {
    path: PathBuf,
}

impl YamlConfigAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for YamlConfigAdapter {
    fn load(&self) -> Result<CompanionConfig, ConfigError> {
        let path = self.path.display().to_string();
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config {} not found, using defaults", path);
                return Ok(CompanionConfig::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let tree = ConfigTree::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        info!("Config loaded from {}", path);
        Ok(CompanionConfig::from_tree(&tree))
    }
}
