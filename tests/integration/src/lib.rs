//! Integration test utilities for the guild role store
//!
//! This crate provides helpers for running end-to-end tests against a store
//! backed by real snapshot files and a real SQLite mirror in a temp directory.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
