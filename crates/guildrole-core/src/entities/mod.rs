//! Domain entities - role registry records and guild configuration

mod guild_config;
mod role_entry;
mod snapshot;

pub use guild_config::{GuildConfig, GuildConfigPatch, Normalized, PendingRoleRequest};
pub use role_entry::{DeletedRoleEntry, MemberGrant, RoleDisplay, RoleEntry};
pub use snapshot::{ConfigSnapshot, RegistrySnapshot};
