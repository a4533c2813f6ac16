//! Debounced dual-write persistence
//!
//! A flush writes the snapshot file first and then the relational mirror.
//! The two writes are independent: a failure in one is logged and counted and
//! does not stop the other. Nothing is retried until the next mutation.

mod debouncer;
mod stats;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use guildrole_core::entities::{ConfigSnapshot, RegistrySnapshot};
use guildrole_core::error::DomainError;
use guildrole_core::traits::{RelationalMirror, RepoResult};

use crate::snapshot::SnapshotCodec;

pub use debouncer::{Debouncer, FlushTarget};
pub use stats::FlushStats;

/// A store shape that knows where it lives in both backends
#[async_trait]
pub(crate) trait Persisted: Send + Sync {
    const STORE: &'static str;

    fn write_snapshot(&self, codec: &SnapshotCodec) -> Result<(), DomainError>;

    async fn write_mirror(&self, mirror: &dyn RelationalMirror) -> RepoResult<()>;
}

#[async_trait]
impl Persisted for RegistrySnapshot {
    const STORE: &'static str = "registry";

    fn write_snapshot(&self, codec: &SnapshotCodec) -> Result<(), DomainError> {
        codec.write_registry(self)
    }

    async fn write_mirror(&self, mirror: &dyn RelationalMirror) -> RepoResult<()> {
        mirror.replace_registry(self).await
    }
}

#[async_trait]
impl Persisted for ConfigSnapshot {
    const STORE: &'static str = "configs";

    fn write_snapshot(&self, codec: &SnapshotCodec) -> Result<(), DomainError> {
        codec.write_configs(self)
    }

    async fn write_mirror(&self, mirror: &dyn RelationalMirror) -> RepoResult<()> {
        mirror.replace_configs(self).await
    }
}

/// Durable targets of one store plus its flush counters
#[derive(Clone)]
pub(crate) struct Persistence {
    codec: Arc<SnapshotCodec>,
    mirror: Option<Arc<dyn RelationalMirror>>,
    stats: Arc<FlushStats>,
}

impl Persistence {
    pub(crate) fn new(codec: Arc<SnapshotCodec>, mirror: Option<Arc<dyn RelationalMirror>>) -> Self {
        Self {
            codec,
            mirror,
            stats: Arc::new(FlushStats::default()),
        }
    }

    pub(crate) fn stats(&self) -> &Arc<FlushStats> {
        &self.stats
    }

    /// Write one consistent state to the snapshot file, then to the mirror
    pub(crate) async fn persist<S: Persisted>(&self, shape: &S) {
        match shape.write_snapshot(&self.codec) {
            Ok(()) => {
                self.stats.record_snapshot(true);
                debug!(store = S::STORE, "Snapshot written");
            }
            Err(e) => {
                self.stats.record_snapshot(false);
                error!(store = S::STORE, error = %e, "Snapshot write failed");
            }
        }

        let Some(mirror) = &self.mirror else {
            return;
        };

        match shape.write_mirror(mirror.as_ref()).await {
            Ok(()) => {
                self.stats.record_mirror(true);
                debug!(store = S::STORE, "Mirror written");
            }
            Err(e) => {
                self.stats.record_mirror(false);
                error!(store = S::STORE, error = %e, "Mirror write failed");
            }
        }
    }
}
