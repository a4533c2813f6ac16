//! Traits (ports) implemented by infrastructure crates

mod mirror;

pub use mirror::{RelationalMirror, RepoResult};
