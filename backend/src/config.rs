//! # Application Configuration
//!
//! Deployment settings loaded once at startup from an optional YAML file,
//! with environment variable overrides applied on top.
//!
//! ```yaml
//! data_directory: "./expense_data"
//! bind_address: "127.0.0.1:3000"
//! allowed_origin: "http://localhost:5173"
//! identity_strategy: "anonymous"   # or "authenticated"
//! token_ttl_days: 30
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const CONFIG_PATH_ENV: &str = "EXPENSE_TRACKER_CONFIG";
pub const DATA_DIR_ENV: &str = "EXPENSE_TRACKER_DATA_DIR";
pub const BIND_ENV: &str = "EXPENSE_TRACKER_BIND";
pub const IDENTITY_ENV: &str = "EXPENSE_TRACKER_IDENTITY";

const DEFAULT_CONFIG_FILE: &str = "expense_tracker.yaml";

/// How the owner of a request is determined. Exactly one is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// Locally generated sync key, replaceable by linking another device
    Anonymous,
    /// User id of a principal holding a valid bearer token
    Authenticated,
}

impl IdentityStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStrategy::Anonymous => "anonymous",
            IdentityStrategy::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Ok(IdentityStrategy::Anonymous),
            "authenticated" => Ok(IdentityStrategy::Authenticated),
            other => Err(anyhow!("Unknown identity strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    pub bind_address: String,
    pub allowed_origin: String,
    pub identity_strategy: IdentityStrategy,
    pub token_ttl_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("expense_data"),
            bind_address: "127.0.0.1:3000".to_string(),
            allowed_origin: "http://localhost:5173".to_string(),
            identity_strategy: IdentityStrategy::Anonymous,
            token_ttl_days: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `EXPENSE_TRACKER_CONFIG`
    /// (or `expense_tracker.yaml`), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_directory = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind_address = bind;
        }
        if let Some(strategy) = lookup(IDENTITY_ENV) {
            self.identity_strategy = strategy.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.token_ttl_days <= 0 {
            return Err(anyhow!("token_ttl_days must be positive"));
        }
        if self.allowed_origin.trim().is_empty() {
            warn!("allowed_origin is empty; browser clients will be rejected by CORS");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.identity_strategy, IdentityStrategy::Anonymous);
        assert_eq!(config.token_ttl_days, 30);
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "identity_strategy: authenticated\ntoken_ttl_days: 7\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.identity_strategy, IdentityStrategy::Authenticated);
        assert_eq!(config.token_ttl_days, 7);
        assert_eq!(config.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_environment_overrides() {
        let mut env = HashMap::new();
        env.insert(DATA_DIR_ENV, "/tmp/expenses".to_string());
        env.insert(IDENTITY_ENV, "Authenticated".to_string());

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).cloned())
            .unwrap();

        assert_eq!(config.data_directory, PathBuf::from("/tmp/expenses"));
        assert_eq!(config.identity_strategy, IdentityStrategy::Authenticated);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| {
            (key == IDENTITY_ENV).then(|| "hybrid".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = AppConfig {
            bind_address: "not-an-address".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
