use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::{DEFAULT_PROTECTION_SCORE, DEFAULT_STORAGE_KEY};

/// Environment variables override the file, e.g. `FRAUDSHIELD_PURCHASES__PROVIDER=sandbox`
const ENV_PREFIX: &str = "FRAUDSHIELD";

/// The provider SDK convention for the API key
const API_KEY_ENV: &str = "REVENUECAT_API_KEY";

/// Main configuration structure
///
/// Priority: Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub purchases: PurchasesConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load from a specific file (it may not exist) layered under the environment
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(
                config::File::from(path.to_path_buf()).format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: Config = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::ConfigError(format!("Failed to load config: {}", e)))?;

        if cfg.purchases.api_key.is_none() {
            cfg.purchases.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        Ok(cfg)
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config dir>/fraudshield/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("fraudshield");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the SQLite state file goes when none is configured
    pub fn default_data_dir() -> crate::Result<PathBuf> {
        Ok(dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("fraudshield"))
    }

    /// Resolved path of the SQLite state file
    pub fn state_db_path(&self) -> crate::Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::default_data_dir()?.join("state.db")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// SQLite file; defaults to the platform data dir
    pub path: Option<PathBuf>,

    /// Key the settings record is stored under
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseProvider {
    /// Fixed catalog, purchases always fail
    #[default]
    Stub,
    /// Purchases always succeed, nothing leaves the process
    Sandbox,
    RevenueCat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PurchasesConfig {
    pub provider: PurchaseProvider,

    /// Provider API key; falls back to `REVENUECAT_API_KEY`
    pub api_key: Option<String>,

    pub app_user_id: String,

    /// Provider REST endpoint
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.revenuecat.com/v1".to_string()
}

impl Default for PurchasesConfig {
    fn default() -> Self {
        Self {
            provider: PurchaseProvider::default(),
            api_key: None,
            app_user_id: "anonymous".to_string(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Start with the demo transactions and alerts
    pub seed_demo_data: bool,

    pub protection_score: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: true,
            protection_score: DEFAULT_PROTECTION_SCORE,
        }
    }
}
