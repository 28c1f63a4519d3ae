use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::pagination::PageSize;
use crate::utils::app_paths::AppPaths;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub grid: GridConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the inventory API, e.g. `http://localhost:8000/api/san`
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Save through the `bulk/` endpoint instead of per-row calls
    pub bulk_save: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Rows per page for grids without a stored preference
    pub default_page_size: PageSize,

    /// Choices offered by the page-size picker
    pub page_size_options: Vec<PageSize>,

    /// Quiet period before preference changes are written
    pub preference_debounce_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceBackend {
    #[default]
    File,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub customer_id: String,
    pub user_id: String,
    pub store: PreferenceBackend,

    /// Directory for the file backend (leave unset for the data directory)
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/san".to_string(),
            timeout_secs: 30,
            bulk_save: false,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::default(),
            page_size_options: vec![
                PageSize::Count(25),
                PageSize::Count(50),
                PageSize::Count(100),
                PageSize::Count(250),
                PageSize::All,
            ],
            preference_debounce_ms: 1000,
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            customer_id: "default".to_string(),
            user_id: "local".to_string(),
            store: PreferenceBackend::File,
            dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, writing defaults if it is missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(AppPaths::config_dir()?.join("config.toml"))
    }

    /// Directory of the file preference store
    pub fn preferences_dir(&self) -> Result<PathBuf> {
        match &self.preferences.dir {
            Some(dir) => Ok(dir.clone()),
            None => AppPaths::preferences_dir(),
        }
    }

    /// A default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# san-grid configuration
# Location: ~/.config/san-grid/config.toml (Linux)
#           ~/Library/Application Support/san-grid/config.toml (macOS)
#           %APPDATA%\san-grid\config.toml (Windows)

[api]
# Root of the inventory API; entities live at {base_url}/{entity}/
base_url = "http://localhost:8000/api/san"

# Seconds before a request is abandoned
timeout_secs = 30

# Save through {base_url}/{entity}/bulk/ in one transaction
bulk_save = false

[grid]
# Rows per page when a grid has no stored preference ("all" disables paging)
default_page_size = 50

# Choices offered by the page-size picker
page_size_options = [25, 50, 100, 250, "all"]

# Milliseconds of quiet before column widths, filters and paging are saved
preference_debounce_ms = 1000

[preferences]
customer_id = "default"
user_id = "local"

# "file" keeps preferences as JSON under the data directory,
# "remote" stores them through the API
store = "file"

# dir = "/path/to/preferences"

[logging]
# Used when RUST_LOG is not set, e.g. "debug" or "san_grid=trace"
level = "info"
"#
        .to_string()
    }
}
