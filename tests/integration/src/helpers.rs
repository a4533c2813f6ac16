//! Test helpers for integration tests
//!
//! Provides a store environment that lives in a temp directory and can be
//! restarted to simulate a process restart or a crash.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use guildrole_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use guildrole_store::{GuildRoleStore, SnapshotCodec};
use tempfile::TempDir;

/// Quiet period used by every test environment
pub const TEST_QUIET_PERIOD: Duration = Duration::from_millis(25);

/// Snapshot files plus an SQLite mirror inside a private temp directory
pub struct TestEnv {
    dir: TempDir,
    config: AppConfig,
}

impl TestEnv {
    /// Environment with both the snapshot files and the SQLite mirror
    pub fn new() -> Result<Self> {
        Self::build(true)
    }

    /// Environment without a relational mirror
    pub fn snapshot_only() -> Result<Self> {
        Self::build(false)
    }

    fn build(with_mirror: bool) -> Result<Self> {
        let dir = TempDir::new()?;
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir)?;

        let data_dir_value = data_dir.display().to_string();
        let database_url = format!("sqlite://{}", data_dir.join("custom_roles.db").display());
        let quiet_period = TEST_QUIET_PERIOD.as_millis().to_string();

        let config = AppConfig::from_lookup(|key| match key {
            "APP_ENV" => Some("development".to_string()),
            "DATA_DIR" => Some(data_dir_value.clone()),
            "DATABASE_URL" if with_mirror => Some(database_url.clone()),
            "FLUSH_QUIET_PERIOD_MS" => Some(quiet_period.clone()),
            _ => None,
        })
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

        // Several tests share the process; only the first one installs the subscriber
        let _ = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env));

        Ok(Self { dir, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Start a store over this environment's files and database
    pub async fn start(&self) -> GuildRoleStore {
        GuildRoleStore::connect(&self.config).await
    }

    /// Read the snapshot files as they are on disk right now
    pub fn disk(&self) -> SnapshotCodec {
        SnapshotCodec::new(
            self.config.storage.roles_path(),
            self.config.storage.config_path(),
        )
    }
}

/// Wait until the quiet period has passed and every flush has finished
pub async fn wait_for_flush(store: &GuildRoleStore) {
    tokio::time::sleep(TEST_QUIET_PERIOD * 4).await;
    store.flush_now().await;
}
