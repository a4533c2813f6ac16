//! Domain errors - error types for the registry and configuration layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Member {owner_id} already owns role {existing_role_id} in guild {guild_id}")]
    OwnerConflict {
        guild_id: Snowflake,
        owner_id: Snowflake,
        existing_role_id: Snowflake,
    },

    #[error("Member {requester_id} already has a pending request in guild {guild_id}")]
    RequestAlreadyPending {
        guild_id: Snowflake,
        requester_id: Snowflake,
    },

    // =========================================================================
    // Persistence Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            // Conflict
            Self::OwnerConflict { .. } => "OWNER_ALREADY_HAS_ROLE",
            Self::RequestAlreadyPending { .. } => "REQUEST_ALREADY_PENDING",

            // Persistence
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::SnapshotError(_) => "SNAPSHOT_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::OwnerConflict { .. } | Self::RequestAlreadyPending { .. }
        )
    }

    /// Check if this error came from a durable backend
    pub fn is_persistence(&self) -> bool {
        !self.is_conflict()
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
