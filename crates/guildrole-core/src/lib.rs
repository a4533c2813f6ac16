//! # guildrole-core
//!
//! Domain layer for the custom role registry: role entries, guild configuration,
//! snapshot shapes, and the relational mirror port.
//! This crate has zero dependencies on infrastructure (database, filesystem, runtime).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ConfigSnapshot, DeletedRoleEntry, GuildConfig, GuildConfigPatch, MemberGrant, Normalized,
    PendingRoleRequest, RegistrySnapshot, RoleDisplay, RoleEntry,
};
pub use error::DomainError;
pub use traits::{RelationalMirror, RepoResult};
pub use value_objects::{Snowflake, SnowflakeParseError};
