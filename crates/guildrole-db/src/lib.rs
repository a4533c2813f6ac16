//! # guildrole-db
//!
//! Relational mirror of the role registry and guild configuration on embedded SQLite via SQLx.
//!
//! ## Overview
//!
//! This crate provides the SQLite implementation of the `RelationalMirror` port
//! defined in `guildrole-core`. It handles:
//!
//! - Connection pool management
//! - Lazy table creation on first use
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Wholesale table replacement on every flush
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guildrole_db::{create_pool, PoolConfig, SqliteMirror};
//! use guildrole_core::RelationalMirror;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::in_memory()).await?;
//!     let mirror = SqliteMirror::new(pool);
//!
//!     let registry = mirror.load_registry().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, PoolConfig, SqlitePool};
pub use repositories::SqliteMirror;
