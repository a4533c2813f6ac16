//! Shared helpers for store integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use guildrole_core::entities::{ConfigSnapshot, RegistrySnapshot, RoleEntry};
use guildrole_core::error::DomainError;
use guildrole_core::traits::{RelationalMirror, RepoResult};
use guildrole_core::value_objects::Snowflake;
use guildrole_store::StoreOptions;
use tempfile::TempDir;

pub const QUIET: Duration = Duration::from_millis(500);

pub fn sf(id: i64) -> Snowflake {
    Snowflake::new(id)
}

pub fn role(role_id: i64, guild_id: i64, owner_id: i64) -> RoleEntry {
    RoleEntry::new(
        sf(role_id),
        sf(guild_id),
        sf(owner_id),
        sf(owner_id),
        format!("role-{role_id}"),
    )
}

pub fn options(dir: &TempDir) -> StoreOptions {
    StoreOptions::in_dir(dir.path().join("data")).with_quiet_period(QUIET)
}

/// Let spawned workers run without moving the paused clock
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// In-memory mirror that records what it was given and can be told to fail
#[derive(Default)]
pub struct RecordingMirror {
    registry: Mutex<RegistrySnapshot>,
    configs: Mutex<ConfigSnapshot>,
    registry_writes: AtomicUsize,
    config_writes: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingMirror {
    pub fn seeded(registry: RegistrySnapshot, configs: ConfigSnapshot) -> Self {
        Self {
            registry: Mutex::new(registry),
            configs: Mutex::new(configs),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn registry(&self) -> RegistrySnapshot {
        self.registry.lock().clone()
    }

    pub fn configs(&self) -> ConfigSnapshot {
        self.configs.lock().clone()
    }

    pub fn registry_writes(&self) -> usize {
        self.registry_writes.load(Ordering::SeqCst)
    }

    pub fn config_writes(&self) -> usize {
        self.config_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("mirror offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalMirror for RecordingMirror {
    async fn ensure_schema(&self) -> RepoResult<()> {
        self.check()
    }

    async fn load_registry(&self) -> RepoResult<RegistrySnapshot> {
        self.check()?;
        Ok(self.registry())
    }

    async fn replace_registry(&self, snapshot: &RegistrySnapshot) -> RepoResult<()> {
        self.check()?;
        *self.registry.lock() = snapshot.clone();
        self.registry_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_configs(&self) -> RepoResult<ConfigSnapshot> {
        self.check()?;
        Ok(self.configs())
    }

    async fn replace_configs(&self, snapshot: &ConfigSnapshot) -> RepoResult<()> {
        self.check()?;
        *self.configs.lock() = snapshot.clone();
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
