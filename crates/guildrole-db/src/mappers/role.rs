//! Role entity <-> model mapper

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use guildrole_core::{DeletedRoleEntry, MemberGrant, RoleEntry, Snowflake};
use sqlx::types::Json;

use crate::models::{DeletedRoleModel, RoleModel};

/// Convert RoleModel to RoleEntry
impl From<RoleModel> for RoleEntry {
    fn from(model: RoleModel) -> Self {
        RoleEntry {
            role_id: Snowflake::new(model.role_id),
            guild_id: Snowflake::new(model.guild_id),
            owner_id: Snowflake::new(model.owner_id),
            created_at: model.created_at,
            updated_at: model.updated_at,
            created_by: Snowflake::new(model.created_by),
            name: model.name,
            color: model.color,
            icon: model.icon,
            // A negative or oversized capacity cannot come from this crate; treat it as unset
            max_members: model.max_members.and_then(|n| u32::try_from(n).ok()),
            member_meta: model.member_meta.0,
        }
    }
}

/// Convert DeletedRoleModel to DeletedRoleEntry
impl From<DeletedRoleModel> for DeletedRoleEntry {
    fn from(model: DeletedRoleModel) -> Self {
        DeletedRoleEntry {
            entry: RoleEntry::from(model.role),
            deleted_at: model.deleted_at,
            deleted_by: Snowflake::new(model.deleted_by),
        }
    }
}

/// Values of a RoleEntry prepared for insertion
pub struct RoleInsert<'a> {
    pub role_id: i64,
    pub guild_id: i64,
    pub owner_id: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: &'a str,
    pub color: i32,
    pub icon: Option<&'a str>,
    pub max_members: Option<i64>,
    pub member_meta: Json<&'a BTreeMap<Snowflake, MemberGrant>>,
}

impl<'a> RoleInsert<'a> {
    pub fn new(entry: &'a RoleEntry) -> Self {
        Self {
            role_id: entry.role_id.into_inner(),
            guild_id: entry.guild_id.into_inner(),
            owner_id: entry.owner_id.into_inner(),
            created_by: entry.created_by.into_inner(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            name: &entry.name,
            color: entry.color,
            icon: entry.icon.as_deref(),
            max_members: entry.max_members.map(i64::from),
            member_meta: Json(&entry.member_meta),
        }
    }
}

/// Values of a DeletedRoleEntry prepared for insertion
pub struct DeletedRoleInsert<'a> {
    pub role: RoleInsert<'a>,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: i64,
}

impl<'a> DeletedRoleInsert<'a> {
    pub fn new(deleted: &'a DeletedRoleEntry) -> Self {
        Self {
            role: RoleInsert::new(&deleted.entry),
            deleted_at: deleted.deleted_at,
            deleted_by: deleted.deleted_by.into_inner(),
        }
    }
}
