//! Role database models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use guildrole_core::{MemberGrant, Snowflake};
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for the custom_roles table
#[derive(Debug, Clone, FromRow)]
pub struct RoleModel {
    pub role_id: i64,
    pub guild_id: i64,
    pub owner_id: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub color: i32,
    pub icon: Option<String>,
    pub max_members: Option<i64>,
    pub member_meta: Json<BTreeMap<Snowflake, MemberGrant>>,
}

/// Database model for the deleted_custom_roles table
#[derive(Debug, Clone, FromRow)]
pub struct DeletedRoleModel {
    #[sqlx(flatten)]
    pub role: RoleModel,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: i64,
}
