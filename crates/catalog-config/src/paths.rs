use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct PathManager {
    config_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("tsugi");
        Ok(Self { config_dir })
    }

    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the config file. `TSUGI_CONFIG` overrides the default
    /// location entirely.
    pub fn config_file(&self) -> PathBuf {
        std::env::var("TSUGI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.config_dir.join("tsugi.toml"))
    }
}
