//! # guildrole-store
//!
//! Application layer: the in-memory role registry and guild configuration store,
//! and the debounced persistence that keeps the snapshot files and the relational
//! mirror up to date.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guildrole_common::AppConfig;
//! use guildrole_store::{GuildRoleStore, WriteMode};
//!
//! async fn example(config: &AppConfig) -> Result<(), guildrole_core::DomainError> {
//!     let store = GuildRoleStore::connect(config).await;
//!
//!     store.registry().add_or_replace(entry, WriteMode::Checked)?;
//!     let roles = store.registry().list_by_guild(guild_id);
//!
//!     store.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod configs;
pub mod options;
pub mod persistence;
pub mod registry;
pub mod snapshot;

mod bootstrap;
mod store;

pub use configs::ConfigStore;
pub use options::StoreOptions;
pub use persistence::FlushStats;
pub use registry::{RoleRegistry, WriteMode};
pub use snapshot::SnapshotCodec;
pub use store::GuildRoleStore;
