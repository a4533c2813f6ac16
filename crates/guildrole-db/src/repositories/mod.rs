//! Repository implementations
//!
//! SQLite implementation of the relational mirror port defined in guildrole-core.

mod error;
mod mirror;

pub use mirror::SqliteMirror;
