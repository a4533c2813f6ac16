//! Entity to model mappers
//!
//! This module provides conversions between domain entities (guildrole-core) and database models.
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database insertion

mod role;

pub use role::{DeletedRoleInsert, RoleInsert};
