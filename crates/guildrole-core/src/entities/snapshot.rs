//! Snapshot shapes - the whole content of each logical store as one value
//!
//! Both durable backends exchange these shapes with the in-memory stores,
//! so a flush always writes one consistent state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeletedRoleEntry, RoleEntry};
use crate::value_objects::Snowflake;

/// Role registry content: active and soft-deleted roles keyed by role id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub roles: BTreeMap<Snowflake, RoleEntry>,
    #[serde(default)]
    pub deleted: BTreeMap<Snowflake, DeletedRoleEntry>,
}

impl RegistrySnapshot {
    /// Check if there is at least one active role
    #[inline]
    pub fn has_active_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Check if both tables are empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.deleted.is_empty()
    }
}

/// Configuration content: raw stored records keyed by guild id
///
/// Records stay raw until read so that normalization can tell whether
/// a record needs to be written back.
pub type ConfigSnapshot = BTreeMap<Snowflake, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let snapshot = RegistrySnapshot::default();
        assert!(snapshot.is_empty());
        assert!(!snapshot.has_active_roles());
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"roles":{},"deleted":{}}"#
        );
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot: RegistrySnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_registry_snapshot_json() {
        let entry = RoleEntry::new(
            Snowflake::new(1),
            Snowflake::new(100),
            Snowflake::new(10),
            Snowflake::new(10),
            "Owls",
        );
        let mut snapshot = RegistrySnapshot::default();
        snapshot.roles.insert(entry.role_id, entry);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RegistrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.has_active_roles());
    }
}
