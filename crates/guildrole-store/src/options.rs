//! Store construction options

use std::path::{Path, PathBuf};
use std::time::Duration;

use guildrole_common::AppConfig;

/// Where the snapshots live and how long the flush quiet period is
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub roles_path: PathBuf,
    pub config_path: PathBuf,
    pub quiet_period: Duration,
}

impl StoreOptions {
    /// Default file names inside `data_dir`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            roles_path: data_dir.join("custom_roles.json"),
            config_path: data_dir.join("custom_role_config.json"),
            quiet_period: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}

impl From<&AppConfig> for StoreOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            roles_path: config.storage.roles_path(),
            config_path: config.storage.config_path(),
            quiet_period: config.persistence.quiet_period(),
        }
    }
}
