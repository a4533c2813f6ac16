//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub storage: StorageConfig,
    /// Relational mirror; `None` runs the store snapshot-only
    pub database: Option<DatabaseConfig>,
    pub persistence: PersistenceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Snapshot file locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_roles_file")]
    pub roles_file: String,
    #[serde(default = "default_config_file")]
    pub config_file: String,
}

impl StorageConfig {
    /// Full path of the role registry snapshot
    #[must_use]
    pub fn roles_path(&self) -> PathBuf {
        self.data_dir.join(&self.roles_file)
    }

    /// Full path of the guild configuration snapshot
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(&self.config_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            roles_file: default_roles_file(),
            config_file: default_config_file(),
        }
    }
}

/// Relational mirror configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Debounced persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_flush_quiet_period_ms")]
    pub flush_quiet_period_ms: u64,
}

impl PersistenceConfig {
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.flush_quiet_period_ms)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            flush_quiet_period_ms: default_flush_quiet_period_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "guildrole".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_roles_file() -> String {
    "custom_roles.json".to_string()
}

fn default_config_file() -> String {
    "custom_role_config.json".to_string()
}

fn default_max_connections() -> u32 {
    1 // embedded SQLite, one writer
}

fn default_flush_quiet_period_ms() -> u64 {
    500
}

/// Parse an optional numeric variable, rejecting values that are present but malformed
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = match lookup("APP_ENV") {
            None => default_env(),
            Some(raw) => {
                Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?
            }
        };

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            None => None,
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
            }),
        };

        let flush_quiet_period_ms = parse_var(&lookup, "FLUSH_QUIET_PERIOD_MS")?
            .unwrap_or_else(default_flush_quiet_period_ms);
        if flush_quiet_period_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "FLUSH_QUIET_PERIOD_MS",
                "0".to_string(),
            ));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            storage: StorageConfig {
                data_dir: lookup("DATA_DIR").map_or_else(default_data_dir, PathBuf::from),
                roles_file: lookup("ROLES_SNAPSHOT_FILE").unwrap_or_else(default_roles_file),
                config_file: lookup("CONFIG_SNAPSHOT_FILE").unwrap_or_else(default_config_file),
            },
            database,
            persistence: PersistenceConfig {
                flush_quiet_period_ms,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_is_development() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_development());
        assert!(!Environment::Production.is_development());
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.app.name, "guildrole");
        assert_eq!(config.app.env, Environment::Development);
        assert!(config.database.is_none());
        assert_eq!(config.persistence.quiet_period(), Duration::from_millis(500));
        assert_eq!(
            config.storage.roles_path(),
            PathBuf::from("./data/custom_roles.json")
        );
        assert_eq!(
            config.storage.config_path(),
            PathBuf::from("./data/custom_role_config.json")
        );
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "Production"),
            ("DATA_DIR", "/var/lib/roles"),
            ("ROLES_SNAPSHOT_FILE", "roles.json"),
            ("DATABASE_URL", "sqlite://roles.db"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("FLUSH_QUIET_PERIOD_MS", "1500"),
        ]))
        .unwrap();

        assert!(config.app.env.is_production());
        assert_eq!(
            config.storage.roles_path(),
            PathBuf::from("/var/lib/roles/roles.json")
        );
        let database = config.database.unwrap();
        assert_eq!(database.url, "sqlite://roles.db");
        assert_eq!(database.max_connections, 2);
        assert_eq!(config.persistence.flush_quiet_period_ms, 1500);
    }

    #[test]
    fn test_blank_database_url_disables_mirror() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("FLUSH_QUIET_PERIOD_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for FLUSH_QUIET_PERIOD_MS: soon"
        );

        assert!(AppConfig::from_lookup(lookup_from(&[("FLUSH_QUIET_PERIOD_MS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("APP_ENV", "qa")])).is_err());
    }
}
