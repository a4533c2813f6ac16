//! Role registry store
//!
//! Active and soft-deleted custom roles, served from memory. Every mutation
//! applies immediately and schedules a debounced flush of the whole registry.

mod state;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

use guildrole_core::entities::{
    DeletedRoleEntry, MemberGrant, RegistrySnapshot, RoleDisplay, RoleEntry,
};
use guildrole_core::error::DomainError;
use guildrole_core::value_objects::Snowflake;

use crate::persistence::{Debouncer, FlushStats, FlushTarget, Persistence};

pub use state::WriteMode;
use state::RegistryState;

struct RegistryInner {
    state: Mutex<RegistryState>,
    persistence: Persistence,
}

#[async_trait]
impl FlushTarget for RegistryInner {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn flush(&self) {
        // Serialize under the lock, write outside it
        let snapshot = self.state.lock().snapshot();
        self.persistence.persist(&snapshot).await;
    }
}

/// Handle to the role registry
///
/// Cheap to clone; all clones share the same tables and flush worker.
#[derive(Clone)]
pub struct RoleRegistry {
    inner: Arc<RegistryInner>,
    flusher: Debouncer,
}

impl RoleRegistry {
    pub(crate) fn new(snapshot: RegistrySnapshot, persistence: Persistence, quiet_period: Duration) -> Self {
        let inner = Arc::new(RegistryInner {
            state: Mutex::new(RegistryState::from_snapshot(snapshot)),
            persistence,
        });
        let flusher = Debouncer::spawn(inner.clone(), quiet_period);
        Self { inner, flusher }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert or fully overwrite the active entry for `entry.role_id`
    ///
    /// Returns the replaced entry, if any. With [`WriteMode::Checked`] the write is
    /// rejected when the owner already has another active role in the guild.
    pub fn add_or_replace(&self, entry: RoleEntry, mode: WriteMode) -> Result<Option<RoleEntry>, DomainError> {
        let (role_id, guild_id, owner_id) = (entry.role_id, entry.guild_id, entry.owner_id);
        let previous = self.inner.state.lock().add_or_replace(entry, mode)?;

        info!(
            role_id = %role_id,
            guild_id = %guild_id,
            owner_id = %owner_id,
            replaced = previous.is_some(),
            "Role stored"
        );
        self.flusher.touch();
        Ok(previous)
    }

    /// Move an active role to the deleted table; `None` if it is not active
    pub fn delete(&self, role_id: Snowflake, deleted_by: Snowflake) -> Option<DeletedRoleEntry> {
        let deleted = self.inner.state.lock().delete(role_id, deleted_by, Utc::now())?;

        info!(role_id = %role_id, guild_id = %deleted.guild_id(), deleted_by = %deleted_by, "Role deleted");
        self.flusher.touch();
        Some(deleted)
    }

    /// Move a deleted role back to the active table, exactly as it was
    pub fn restore(&self, role_id: Snowflake, mode: WriteMode) -> Result<Option<RoleEntry>, DomainError> {
        let Some(entry) = self.inner.state.lock().restore(role_id, mode)? else {
            return Ok(None);
        };

        info!(role_id = %role_id, guild_id = %entry.guild_id, "Role restored");
        self.flusher.touch();
        Ok(Some(entry))
    }

    /// Permanently forget a deleted role
    pub fn purge_deleted(&self, role_id: Snowflake) -> Option<DeletedRoleEntry> {
        let purged = self.inner.state.lock().purge_deleted(role_id)?;

        info!(role_id = %role_id, guild_id = %purged.guild_id(), "Deleted role purged");
        self.flusher.touch();
        Some(purged)
    }

    pub fn update_display(&self, role_id: Snowflake, display: RoleDisplay) -> Option<RoleEntry> {
        let updated = self.inner.state.lock().update_display(role_id, display);
        self.after_update(role_id, updated)
    }

    pub fn set_max_members(&self, role_id: Snowflake, max_members: Option<u32>) -> Option<RoleEntry> {
        let updated = self.inner.state.lock().set_max_members(role_id, max_members);
        self.after_update(role_id, updated)
    }

    /// Hand a role to another member, subject to the ownership rule
    pub fn transfer_owner(
        &self,
        role_id: Snowflake,
        new_owner: Snowflake,
        mode: WriteMode,
    ) -> Result<Option<RoleEntry>, DomainError> {
        let updated = self.inner.state.lock().transfer_owner(role_id, new_owner, mode)?;
        Ok(self.after_update(role_id, updated))
    }

    pub fn record_member_grant(
        &self,
        role_id: Snowflake,
        member_id: Snowflake,
        grant: MemberGrant,
    ) -> Option<RoleEntry> {
        let updated = self.inner.state.lock().record_member_grant(role_id, member_id, grant);
        self.after_update(role_id, updated)
    }

    pub fn remove_member_grant(&self, role_id: Snowflake, member_id: Snowflake) -> Option<RoleEntry> {
        let updated = self.inner.state.lock().remove_member_grant(role_id, member_id);
        self.after_update(role_id, updated)
    }

    fn after_update(&self, role_id: Snowflake, updated: Option<RoleEntry>) -> Option<RoleEntry> {
        if updated.is_some() {
            debug!(role_id = %role_id, "Role updated");
            self.flusher.touch();
        }
        updated
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, role_id: Snowflake) -> Option<RoleEntry> {
        self.inner.state.lock().get(role_id).cloned()
    }

    pub fn get_deleted(&self, role_id: Snowflake) -> Option<DeletedRoleEntry> {
        self.inner.state.lock().get_deleted(role_id).cloned()
    }

    /// Active roles of a guild, oldest first
    pub fn list_by_guild(&self, guild_id: Snowflake) -> Vec<RoleEntry> {
        self.inner.state.lock().list_by_guild(guild_id)
    }

    /// Deleted roles of a guild, in deletion order
    pub fn list_deleted_by_guild(&self, guild_id: Snowflake) -> Vec<DeletedRoleEntry> {
        self.inner.state.lock().list_deleted_by_guild(guild_id)
    }

    pub fn find_by_owner(&self, guild_id: Snowflake, owner_id: Snowflake) -> Option<RoleEntry> {
        self.inner.state.lock().find_by_owner(guild_id, owner_id).cloned()
    }

    /// Number of active roles
    pub fn len(&self) -> usize {
        self.inner.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of soft-deleted roles
    pub fn deleted_len(&self) -> usize {
        self.inner.state.lock().deleted_len()
    }

    /// Copy of the whole registry, in snapshot form
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.state.lock().snapshot()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

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
