//! # CSV Global Config Repository
//!
//! File-based global configuration stored in `global_config.yaml` at the root
//! of the data directory.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── global_config.yaml    ← This module manages this file
//! ├── users.yaml
//! └── owners/{owner_key}/
//!     ├── expenses.csv
//!     └── salaries.yaml
//! ```
//!
//! ## YAML Format
//!
//! ```yaml
//! active_sync_key: "8f14e45f-ceea-467a-9af0-fd0a1b2c3d4e"
//! data_format_version: "1.0"
//! created_at: "2026-01-21T19:30:00Z"
//! updated_at: "2026-01-21T19:35:00Z"
//! ```

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::connection::CsvConnection;

const GLOBAL_CONFIG_FILE_NAME: &str = "global_config.yaml";

/// Global configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Anonymous sync key of this installation (None until first generated)
    pub active_sync_key: Option<String>,
    /// Data format version for future migrations
    pub data_format_version: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            active_sync_key: None,
            data_format_version: "1.0".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Storage trait for global configuration operations
pub trait GlobalConfigStorage: Send + Sync {
    /// Get the global configuration, creating the default file if missing
    fn get_global_config(&self) -> Result<GlobalConfig>;

    /// Set or clear the active sync key
    fn set_active_sync_key(&self, sync_key: Option<String>) -> Result<()>;

    /// Update the global configuration
    fn update_global_config(&self, config: &GlobalConfig) -> Result<()>;
}

/// Global config repository backed by a single YAML file
#[derive(Clone)]
pub struct GlobalConfigRepository {
    connection: CsvConnection,
}

impl GlobalConfigRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_global_config_path(&self) -> PathBuf {
        self.connection.base_directory().join(GLOBAL_CONFIG_FILE_NAME)
    }

    /// Load global config from file, creating default if it doesn't exist.
    /// Caller holds the write lock.
    fn load_or_create_global_config(&self) -> Result<GlobalConfig> {
        let config_path = self.get_global_config_path();

        if config_path.exists() {
            let yaml_content = fs::read_to_string(&config_path)?;
            let config: GlobalConfig = serde_yaml::from_str(&yaml_content)?;
            debug!("Loaded global config from {:?}", config_path);
            Ok(config)
        } else {
            let config = GlobalConfig::default();
            self.save_global_config(&config)?;
            info!("Created default global config at {:?}", config_path);
            Ok(config)
        }
    }

    fn save_global_config(&self, config: &GlobalConfig) -> Result<()> {
        let config_path = self.get_global_config_path();
        let yaml_content = serde_yaml::to_string(config)?;
        CsvConnection::write_atomically(&config_path, yaml_content.as_bytes())?;
        debug!("Saved global config to {:?}", config_path);
        Ok(())
    }
}

impl GlobalConfigStorage for GlobalConfigRepository {
    fn get_global_config(&self) -> Result<GlobalConfig> {
        let _guard = self.connection.lock_writes();
        self.load_or_create_global_config()
    }

    fn set_active_sync_key(&self, sync_key: Option<String>) -> Result<()> {
        let _guard = self.connection.lock_writes();

        let mut config = self.load_or_create_global_config()?;
        config.active_sync_key = sync_key.clone();
        config.updated_at = Utc::now().to_rfc3339();
        self.save_global_config(&config)?;

        match sync_key {
            Some(key) => info!("Set active sync key to '{}'", key),
            None => info!("Cleared active sync key"),
        }
        Ok(())
    }

    fn update_global_config(&self, config: &GlobalConfig) -> Result<()> {
        let _guard = self.connection.lock_writes();

        let mut updated_config = config.clone();
        updated_config.updated_at = Utc::now().to_rfc3339();
        self.save_global_config(&updated_config)?;
        info!("Updated global config");
        Ok(())
    }
}
