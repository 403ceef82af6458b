use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::ImageId;
use crate::{Error, Result};

/// Image ids visited by `dump` when neither flags nor config say otherwise
pub const DEFAULT_IMAGE_RANGE: std::ops::Range<ImageId> = 0..20;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeatdbConfig {
    pub database: Option<String>,
    pub start: Option<ImageId>,
    pub end: Option<ImageId>,
}

impl FeatdbConfig {
    /// Database path from the config, falling back to `featdb.db`
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    pub fn image_range(&self) -> std::ops::Range<ImageId> {
        let start = self.start.unwrap_or(DEFAULT_IMAGE_RANGE.start);
        let end = self.end.unwrap_or(DEFAULT_IMAGE_RANGE.end);
        start..end
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("featdb.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("featdb.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<FeatdbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FeatdbConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FeatdbConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}
