//! In-memory registry tables and the guild index

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use guildrole_core::entities::{
    DeletedRoleEntry, MemberGrant, RegistrySnapshot, RoleDisplay, RoleEntry,
};
use guildrole_core::error::DomainError;
use guildrole_core::value_objects::Snowflake;

/// How a write treats the one-active-role-per-owner rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Reject a write that would give an owner a second active role in a guild
    #[default]
    Checked,
    /// Administrative override: skip the ownership check
    Force,
}

/// Active and deleted tables plus the derived guild index
///
/// A role id lives in at most one of the two tables. The index maps a guild to
/// its active role ids and is rebuilt on the next guild-scoped read after any
/// change to the active table.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    active: HashMap<Snowflake, RoleEntry>,
    deleted: HashMap<Snowflake, DeletedRoleEntry>,
    by_guild: HashMap<Snowflake, Vec<Snowflake>>,
    index_dirty: bool,
}

impl RegistryState {
    pub(crate) fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let RegistrySnapshot { roles, deleted } = snapshot;

        let active: HashMap<_, _> = roles.into_iter().collect();
        let deleted = deleted
            .into_iter()
            .filter(|(role_id, _)| {
                let clash = active.contains_key(role_id);
                if clash {
                    warn!(role_id = %role_id, "Role is both active and deleted; keeping the active entry");
                }
                !clash
            })
            .collect();

        Self {
            active,
            deleted,
            by_guild: HashMap::new(),
            index_dirty: true,
        }
    }

    pub(crate) fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            roles: self
                .active
                .iter()
                .map(|(id, entry)| (*id, entry.clone()))
                .collect(),
            deleted: self
                .deleted
                .iter()
                .map(|(id, entry)| (*id, entry.clone()))
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn deleted_len(&self) -> usize {
        self.deleted.len()
    }

    pub(crate) fn get(&self, role_id: Snowflake) -> Option<&RoleEntry> {
        self.active.get(&role_id)
    }

    pub(crate) fn get_deleted(&self, role_id: Snowflake) -> Option<&DeletedRoleEntry> {
        self.deleted.get(&role_id)
    }

    /// Earliest-created active role of an owner in a guild
    pub(crate) fn find_by_owner(&self, guild_id: Snowflake, owner_id: Snowflake) -> Option<&RoleEntry> {
        self.active
            .values()
            .filter(|entry| entry.guild_id == guild_id && entry.owner_id == owner_id)
            .min_by_key(|entry| (entry.created_at, entry.role_id))
    }

    pub(crate) fn list_by_guild(&mut self, guild_id: Snowflake) -> Vec<RoleEntry> {
        if self.index_dirty {
            self.rebuild_index();
        }

        self.by_guild
            .get(&guild_id)
            .map(|ids| ids.iter().filter_map(|id| self.active.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn list_deleted_by_guild(&self, guild_id: Snowflake) -> Vec<DeletedRoleEntry> {
        let mut entries: Vec<_> = self
            .deleted
            .values()
            .filter(|entry| entry.guild_id() == guild_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.deleted_at, entry.role_id()));
        entries
    }

    pub(crate) fn add_or_replace(
        &mut self,
        entry: RoleEntry,
        mode: WriteMode,
    ) -> Result<Option<RoleEntry>, DomainError> {
        self.check_owner(entry.guild_id, entry.owner_id, entry.role_id, mode)?;

        if self.deleted.remove(&entry.role_id).is_some() {
            warn!(role_id = %entry.role_id, "Re-adding a deleted role; dropping its deleted entry");
        }

        self.index_dirty = true;
        Ok(self.active.insert(entry.role_id, entry))
    }

    pub(crate) fn delete(
        &mut self,
        role_id: Snowflake,
        deleted_by: Snowflake,
        deleted_at: DateTime<Utc>,
    ) -> Option<DeletedRoleEntry> {
        let entry = self.active.remove(&role_id)?;
        let deleted = entry.into_deleted(deleted_by, deleted_at);

        self.deleted.insert(role_id, deleted.clone());
        self.index_dirty = true;
        Some(deleted)
    }

    pub(crate) fn restore(
        &mut self,
        role_id: Snowflake,
        mode: WriteMode,
    ) -> Result<Option<RoleEntry>, DomainError> {
        let Some(deleted) = self.deleted.remove(&role_id) else {
            return Ok(None);
        };
        if let Err(e) = self.check_owner(deleted.guild_id(), deleted.entry.owner_id, role_id, mode) {
            self.deleted.insert(role_id, deleted);
            return Err(e);
        }
        let entry = deleted.into_restored();

        self.active.insert(role_id, entry.clone());
        self.index_dirty = true;
        Ok(Some(entry))
    }

    pub(crate) fn purge_deleted(&mut self, role_id: Snowflake) -> Option<DeletedRoleEntry> {
        self.deleted.remove(&role_id)
    }

    pub(crate) fn update_display(&mut self, role_id: Snowflake, display: RoleDisplay) -> Option<RoleEntry> {
        self.update(role_id, |entry| entry.apply_display(display))
    }

    pub(crate) fn set_max_members(&mut self, role_id: Snowflake, max_members: Option<u32>) -> Option<RoleEntry> {
        self.update(role_id, |entry| entry.max_members = max_members)
    }

    pub(crate) fn transfer_owner(
        &mut self,
        role_id: Snowflake,
        new_owner: Snowflake,
        mode: WriteMode,
    ) -> Result<Option<RoleEntry>, DomainError> {
        let Some(guild_id) = self.active.get(&role_id).map(|entry| entry.guild_id) else {
            return Ok(None);
        };
        self.check_owner(guild_id, new_owner, role_id, mode)?;

        Ok(self.update(role_id, |entry| entry.owner_id = new_owner))
    }

    pub(crate) fn record_member_grant(
        &mut self,
        role_id: Snowflake,
        member_id: Snowflake,
        grant: MemberGrant,
    ) -> Option<RoleEntry> {
        self.update(role_id, |entry| {
            entry.member_meta.insert(member_id, grant);
        })
    }

    pub(crate) fn remove_member_grant(&mut self, role_id: Snowflake, member_id: Snowflake) -> Option<RoleEntry> {
        self.update(role_id, |entry| {
            entry.member_meta.remove(&member_id);
        })
    }

    fn update(&mut self, role_id: Snowflake, change: impl FnOnce(&mut RoleEntry)) -> Option<RoleEntry> {
        let entry = self.active.get_mut(&role_id)?;
        change(entry);
        entry.touch();

        self.index_dirty = true;
        Some(entry.clone())
    }

    fn check_owner(
        &self,
        guild_id: Snowflake,
        owner_id: Snowflake,
        role_id: Snowflake,
        mode: WriteMode,
    ) -> Result<(), DomainError> {
        if mode == WriteMode::Force {
            return Ok(());
        }

        match self
            .active
            .values()
            .find(|entry| entry.guild_id == guild_id && entry.owner_id == owner_id && entry.role_id != role_id)
        {
            Some(existing) => Err(DomainError::OwnerConflict {
                guild_id,
                owner_id,
                existing_role_id: existing.role_id,
            }),
            None => Ok(()),
        }
    }

    fn rebuild_index(&mut self) {
        let mut by_guild: HashMap<Snowflake, Vec<&RoleEntry>> = HashMap::new();
        for entry in self.active.values() {
            by_guild.entry(entry.guild_id).or_default().push(entry);
        }

        self.by_guild = by_guild
            .into_iter()
            .map(|(guild_id, mut entries)| {
                entries.sort_by_key(|entry| (entry.created_at, entry.role_id));
                (guild_id, entries.into_iter().map(|entry| entry.role_id).collect())
            })
            .collect();
        self.index_dirty = false;
    }
}
