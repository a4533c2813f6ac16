//! Database models - SQLx-compatible structs for the mirror tables

mod config;
mod role;

pub use config::ConfigModel;
pub use role::{DeletedRoleModel, RoleModel};
