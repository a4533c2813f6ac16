//! Flat-file snapshots of the registry and configuration stores

mod codec;

pub use codec::SnapshotCodec;
