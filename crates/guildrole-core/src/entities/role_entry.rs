//! Role entry - one custom role tracked by the registry, plus its soft-deleted form

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{timestamp, Snowflake};

/// Provenance of a single membership grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberGrant {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_by: Option<Snowflake>,
    #[serde(default)]
    pub assigned_by_is_bot: bool,
}

impl MemberGrant {
    /// Grant made by a member right now
    pub fn by_member(assigned_by: Snowflake) -> Self {
        Self {
            assigned_at: Utc::now(),
            assigned_by: Some(assigned_by),
            assigned_by_is_bot: false,
        }
    }

    /// Grant made by a bot account right now
    pub fn by_bot(assigned_by: Snowflake) -> Self {
        Self {
            assigned_at: Utc::now(),
            assigned_by: Some(assigned_by),
            assigned_by_is_bot: true,
        }
    }
}

/// Display attributes mirrored from the platform role object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDisplay {
    pub name: Option<String>,
    pub color: Option<i32>,
    /// `Some(None)` clears the icon
    pub icon: Option<Option<String>>,
}

/// Active custom role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntry {
    pub role_id: Snowflake,
    pub guild_id: Snowflake,
    pub owner_id: Snowflake,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    pub created_by: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: i32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub max_members: Option<u32>,
    #[serde(default)]
    pub member_meta: BTreeMap<Snowflake, MemberGrant>,
}

impl RoleEntry {
    /// Create a new entry for a freshly granted role
    pub fn new(
        role_id: Snowflake,
        guild_id: Snowflake,
        owner_id: Snowflake,
        created_by: Snowflake,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            role_id,
            guild_id,
            owner_id,
            created_at: now,
            updated_at: now,
            created_by,
            name: name.into(),
            color: 0,
            icon: None,
            max_members: None,
            member_meta: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: i32) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn with_max_members(mut self, max_members: u32) -> Self {
        self.max_members = Some(max_members);
        self
    }

    /// Bump `updated_at`
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply display changes; fields left as `None` are untouched
    pub fn apply_display(&mut self, display: RoleDisplay) {
        if let Some(name) = display.name {
            self.name = name;
        }
        if let Some(color) = display.color {
            self.color = color;
        }
        if let Some(icon) = display.icon {
            self.icon = icon;
        }
        self.touch();
    }

    /// Number of members with a recorded grant
    pub fn member_count(&self) -> usize {
        self.member_meta.len()
    }

    /// Move this entry into its soft-deleted form
    pub fn into_deleted(self, deleted_by: Snowflake, deleted_at: DateTime<Utc>) -> DeletedRoleEntry {
        DeletedRoleEntry {
            entry: self,
            deleted_at,
            deleted_by,
        }
    }
}

/// Soft-deleted custom role: the full entry plus deletion metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRoleEntry {
    #[serde(flatten)]
    pub entry: RoleEntry,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: Snowflake,
}

impl DeletedRoleEntry {
    #[inline]
    pub fn role_id(&self) -> Snowflake {
        self.entry.role_id
    }

    #[inline]
    pub fn guild_id(&self) -> Snowflake {
        self.entry.guild_id
    }

    /// Strip deletion metadata, yielding the entry exactly as it was before deletion
    pub fn into_restored(self) -> RoleEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoleEntry {
        RoleEntry::new(
            Snowflake::new(1),
            Snowflake::new(100),
            Snowflake::new(10),
            Snowflake::new(10),
            "Night Owls",
        )
    }

    #[test]
    fn test_role_entry_creation() {
        let entry = sample();
        assert_eq!(entry.name, "Night Owls");
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.member_count(), 0);
        assert!(entry.icon.is_none());
    }

    #[test]
    fn test_deleted_entry_reads_epoch_millis() {
        let raw = serde_json::json!({
            "roleId": "1",
            "guildId": "100",
            "ownerId": "10",
            "createdBy": "10",
            "createdAt": 1_714_557_600_000_u64,
            "updatedAt": "2024-05-01T10:00:00Z",
            "memberMeta": { "11": { "assignedAt": 1_714_557_600_000_u64 } },
            "deletedAt": 1_714_557_600_000_u64,
            "deletedBy": "20",
        });

        let deleted: DeletedRoleEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(deleted.entry.created_at, deleted.entry.updated_at);
        assert_eq!(deleted.deleted_at, deleted.entry.created_at);
        assert_eq!(
            deleted.entry.member_meta[&Snowflake::new(11)].assigned_at,
            deleted.deleted_at
        );
    }

    #[test]
    fn test_apply_display_only_touches_given_fields() {
        let mut entry = sample().with_icon("owl.png").with_color(5);
        let before = entry.updated_at;

        entry.apply_display(RoleDisplay {
            name: Some("Early Birds".to_string()),
            ..RoleDisplay::default()
        });

        assert_eq!(entry.name, "Early Birds");
        assert_eq!(entry.color, 5);
        assert_eq!(entry.icon.as_deref(), Some("owl.png"));
        assert!(entry.updated_at >= before);

        entry.apply_display(RoleDisplay {
            icon: Some(None),
            ..RoleDisplay::default()
        });
        assert!(entry.icon.is_none());
    }

    #[test]
    fn test_delete_restore_keeps_entry_intact() {
        let mut entry = sample().with_max_members(5);
        entry
            .member_meta
            .insert(Snowflake::new(11), MemberGrant::by_bot(Snowflake::new(99)));

        let deleted = entry.clone().into_deleted(Snowflake::new(20), Utc::now());
        assert_eq!(deleted.role_id(), Snowflake::new(1));
        assert_eq!(deleted.deleted_by, Snowflake::new(20));
        assert_eq!(deleted.into_restored(), entry);
    }

    #[test]
    fn test_deleted_entry_json_is_flat() {
        let deleted = sample().into_deleted(Snowflake::new(20), Utc::now());
        let value = serde_json::to_value(&deleted).unwrap();

        assert_eq!(value["roleId"], "1");
        assert_eq!(value["ownerId"], "10");
        assert_eq!(value["deletedBy"], "20");
        assert!(value.get("entry").is_none());

        let back: DeletedRoleEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, deleted);
    }

    #[test]
    fn test_entry_tolerates_missing_optional_fields() {
        let json = r#"{
            "roleId": "1", "guildId": "100", "ownerId": "10", "createdBy": "10",
            "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"
        }"#;
        let entry: RoleEntry = serde_json::from_str(json).unwrap();
        assert!(entry.name.is_empty());
        assert!(entry.member_meta.is_empty());
        assert!(entry.max_members.is_none());
    }
}
