use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "san-grid";

/// Platform directories for config, data and preferences
pub struct AppPaths;

impl AppPaths {
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Cannot determine config directory"))?
            .join(APP_DIR);
        Ok(config_dir)
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Cannot determine data directory"))?
            .join(APP_DIR);

        fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    /// Default location of the file preference store
    pub fn preferences_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?.join("preferences");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
