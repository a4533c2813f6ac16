//! Relational mirror port - the interface the stores use to reach the database
//!
//! The mirror holds the same content as the snapshot files in normalized tables.
//! It is written wholesale on every flush and read once, at bootstrap.

use async_trait::async_trait;

use crate::entities::{ConfigSnapshot, RegistrySnapshot};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait RelationalMirror: Send + Sync {
    /// Create the mirror tables if they do not exist yet
    async fn ensure_schema(&self) -> RepoResult<()>;

    /// Load every active and soft-deleted role
    async fn load_registry(&self) -> RepoResult<RegistrySnapshot>;

    /// Replace both role tables with the given content
    async fn replace_registry(&self, snapshot: &RegistrySnapshot) -> RepoResult<()>;

    /// Load every stored guild configuration record
    async fn load_configs(&self) -> RepoResult<ConfigSnapshot>;

    /// Replace the configuration table with the given content
    async fn replace_configs(&self, snapshot: &ConfigSnapshot) -> RepoResult<()>;
}
