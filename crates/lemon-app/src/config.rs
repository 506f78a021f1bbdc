//! Configuration file management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LITTLE_LEMON_DATA_DIR";

/// Complete app configuration, read from `config.toml` in the data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Menu settings.
    #[serde(default)]
    pub menu: MenuConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Menu cache database file name, relative to the data directory.
    #[serde(default = "default_menu_db")]
    pub menu_db: String,
    /// Preferences (session) database file name.
    #[serde(default = "default_preferences_db")]
    pub preferences_db: String,
}

/// Menu configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Filter sections, in display order.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// JSON menu document loaded when the cache is empty at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_menu_db() -> String {
    "little_lemon.db".to_string()
}

fn default_preferences_db() -> String {
    "preferences.db".to_string()
}

fn default_categories() -> Vec<String> {
    lemon_types::DEFAULT_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            menu_db: default_menu_db(),
            preferences_db: default_preferences_db(),
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            seed_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` in `data_dir`, or from the
    /// default data directory when none is given.
    ///
    /// Falls back to defaults if the file does not exist. An explicit
    /// `data_dir` always wins over the one written in the file.
    pub fn load(data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_data_dir);
        let config_path = dir.join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            Self::default()
        };

        if let Some(dir) = data_dir {
            config.storage.data_dir = dir.display().to_string();
        }
        Ok(config)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn menu_db_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.menu_db)
    }

    pub fn preferences_db_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.preferences_db)
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/LittleLemon")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("LittleLemon")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".little-lemon")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/little-lemon"))
}
