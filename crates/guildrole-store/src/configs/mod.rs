//! Guild configuration store
//!
//! Records are loaded raw and normalized the first time a guild is read. A
//! guild that has never been seen gets a default record, which is persisted.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use guildrole_core::entities::{
    ConfigSnapshot, GuildConfig, GuildConfigPatch, PendingRoleRequest,
};
use guildrole_core::error::DomainError;
use guildrole_core::value_objects::Snowflake;

use crate::persistence::{Debouncer, FlushStats, FlushTarget, Persistence};

/// Stored records, split by whether they have been normalized yet
///
/// A guild id is in at most one of the two maps.
#[derive(Debug, Default)]
struct ConfigState {
    /// As loaded from a backend, not yet read
    raw: HashMap<Snowflake, Value>,
    ready: HashMap<Snowflake, GuildConfig>,
}

impl ConfigState {
    fn from_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            raw: snapshot.into_iter().collect(),
            ready: HashMap::new(),
        }
    }

    fn snapshot(&self) -> ConfigSnapshot {
        let raw = self.raw.iter().map(|(guild_id, raw)| (*guild_id, raw.clone()));
        let ready = self
            .ready
            .iter()
            .map(|(guild_id, config)| (*guild_id, config.to_record()));
        raw.chain(ready).collect()
    }

    fn contains(&self, guild_id: Snowflake) -> bool {
        self.raw.contains_key(&guild_id) || self.ready.contains_key(&guild_id)
    }

    fn len(&self) -> usize {
        self.raw.len() + self.ready.len()
    }

    /// Normalized record for a guild, created if absent
    ///
    /// The flag is true when the stored form changed and needs to be written.
    fn resolve(&mut self, guild_id: Snowflake) -> (&mut GuildConfig, bool) {
        let mut changed = false;

        if let Some(raw) = self.raw.remove(&guild_id) {
            let normalized = GuildConfig::normalize(&raw);
            if normalized.dropped > 0 {
                warn!(
                    guild_id = %guild_id,
                    dropped = normalized.dropped,
                    "Discarded undecodable values from guild config"
                );
            } else if normalized.changed {
                debug!(guild_id = %guild_id, "Guild config normalized");
            }
            changed = normalized.changed;
            self.ready.insert(guild_id, normalized.config);
        }

        match self.ready.entry(guild_id) {
            Entry::Occupied(occupied) => (occupied.into_mut(), changed),
            Entry::Vacant(vacant) => {
                debug!(guild_id = %guild_id, "Creating default guild config");
                (vacant.insert(GuildConfig::default()), true)
            }
        }
    }
}

struct ConfigInner {
    state: Mutex<ConfigState>,
    persistence: Persistence,
}

#[async_trait]
impl FlushTarget for ConfigInner {
    fn name(&self) -> &'static str {
        "configs"
    }

    async fn flush(&self) {
        let snapshot = self.state.lock().snapshot();
        self.persistence.persist(&snapshot).await;
    }
}

/// Handle to the per-guild configuration store
///
/// Cheap to clone; all clones share the same records and flush worker.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<ConfigInner>,
    flusher: Debouncer,
}

impl ConfigStore {
    pub(crate) fn new(snapshot: ConfigSnapshot, persistence: Persistence, quiet_period: Duration) -> Self {
        let inner = Arc::new(ConfigInner {
            state: Mutex::new(ConfigState::from_snapshot(snapshot)),
            persistence,
        });
        let flusher = Debouncer::spawn(inner.clone(), quiet_period);
        Self { inner, flusher }
    }

    /// Run `change` against a guild's normalized record
    ///
    /// `change` returns its result and whether it modified the record; a write is
    /// scheduled if it did or if normalization rewrote the record.
    fn with_config<R>(&self, guild_id: Snowflake, change: impl FnOnce(&mut GuildConfig) -> (R, bool)) -> R {
        let (result, dirty) = {
            let mut state = self.inner.state.lock();
            let (config, normalized) = state.resolve(guild_id);
            let (result, modified) = change(config);
            (result, normalized || modified)
        };

        if dirty {
            self.flusher.touch();
        }
        result
    }

    /// Normalized configuration of a guild, creating the default record on first access
    pub fn get(&self, guild_id: Snowflake) -> GuildConfig {
        self.with_config(guild_id, |config| (config.clone(), false))
    }

    /// Shallow-merge a patch; each field the patch sets replaces the stored field
    pub fn update(&self, guild_id: Snowflake, patch: GuildConfigPatch) -> GuildConfig {
        self.with_config(guild_id, |config| {
            if patch.is_empty() {
                return (config.clone(), false);
            }
            patch.apply(config);
            (config.clone(), true)
        })
    }

    /// Record a new pending role request
    pub fn open_role_request(
        &self,
        guild_id: Snowflake,
        requester_id: Snowflake,
        request: PendingRoleRequest,
    ) -> Result<GuildConfig, DomainError> {
        let config = self.with_config(guild_id, |config| {
            match config.open_request(guild_id, requester_id, request) {
                Ok(()) => (Ok(config.clone()), true),
                Err(e) => (Err(e), false),
            }
        })?;

        info!(guild_id = %guild_id, requester_id = %requester_id, "Role request opened");
        Ok(config)
    }

    /// Close a pending request as approved
    pub fn approve_role_request(&self, guild_id: Snowflake, requester_id: Snowflake) -> Option<PendingRoleRequest> {
        let request = self.with_config(guild_id, |config| {
            let request = config.approve_request(requester_id);
            let modified = request.is_some();
            (request, modified)
        })?;

        info!(guild_id = %guild_id, requester_id = %requester_id, "Role request approved");
        Some(request)
    }

    /// Close a pending request as rejected and start the requester's cooldown
    pub fn reject_role_request(
        &self,
        guild_id: Snowflake,
        requester_id: Snowflake,
        rejected_at: DateTime<Utc>,
    ) -> Option<PendingRoleRequest> {
        let request = self.with_config(guild_id, |config| {
            let request = config.reject_request(requester_id, rejected_at);
            let modified = request.is_some();
            (request, modified)
        })?;

        info!(guild_id = %guild_id, requester_id = %requester_id, "Role request rejected");
        Some(request)
    }

    /// Stamp the guild-wide activity reset
    pub fn mark_activity_reset(&self, guild_id: Snowflake, at: DateTime<Utc>) -> GuildConfig {
        self.with_config(guild_id, |config| {
            config.activity_reset_at = Some(at);
            (config.clone(), true)
        })
    }

    /// Stamp the activity reset of one role, keeping the other roles' stamps
    pub fn mark_role_activity_reset(&self, guild_id: Snowflake, role_id: Snowflake, at: DateTime<Utc>) -> GuildConfig {
        self.with_config(guild_id, |config| {
            config.role_activity_reset_at.insert(role_id, at);
            (config.clone(), true)
        })
    }

    /// Check whether a record exists for a guild, without creating one
    pub fn contains(&self, guild_id: Snowflake) -> bool {
        self.inner.state.lock().contains(guild_id)
    }

    /// Number of stored guild records
    pub fn len(&self) -> usize {
        self.inner.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored record, in snapshot form
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn stats(&self) -> &FlushStats {
        self.inner.persistence.stats()
    }

    /// Write pending changes now instead of waiting for the quiet period
    pub async fn flush_now(&self) {
        self.flusher.flush_now().await;
    }

    pub(crate) async fn shutdown(&self) {
        self.flusher.shutdown().await;
    }
}
