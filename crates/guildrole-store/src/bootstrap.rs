//! Startup reconciliation between the snapshot files and the relational mirror
//!
//! Each store is decided on its own. A mirror that already holds data wins and
//! the snapshot file is rewritten from it; an empty mirror is seeded from the
//! snapshot. An unreachable mirror is logged and the snapshot is used.

use tracing::{error, info, warn};

use guildrole_core::entities::{ConfigSnapshot, RegistrySnapshot};
use guildrole_core::traits::RelationalMirror;

use crate::snapshot::SnapshotCodec;

pub(crate) async fn load_registry(
    codec: &SnapshotCodec,
    mirror: Option<&dyn RelationalMirror>,
) -> RegistrySnapshot {
    let Some(mirror) = mirror else {
        return codec.load_registry();
    };

    match mirror.load_registry().await {
        Ok(from_mirror) if from_mirror.has_active_roles() => {
            info!(
                roles = from_mirror.roles.len(),
                deleted = from_mirror.deleted.len(),
                "Registry loaded from mirror"
            );
            if let Err(e) = codec.write_registry(&from_mirror) {
                error!(error = %e, "Failed to refresh registry snapshot from mirror");
            }
            from_mirror
        }
        Ok(_) => {
            let from_snapshot = codec.load_registry();
            info!(
                roles = from_snapshot.roles.len(),
                deleted = from_snapshot.deleted.len(),
                "Registry loaded from snapshot; seeding mirror"
            );
            if let Err(e) = mirror.replace_registry(&from_snapshot).await {
                error!(error = %e, "Failed to seed mirror with registry");
            }
            from_snapshot
        }
        Err(e) => {
            warn!(error = %e, "Mirror unavailable; registry loaded from snapshot");
            codec.load_registry()
        }
    }
}

pub(crate) async fn load_configs(
    codec: &SnapshotCodec,
    mirror: Option<&dyn RelationalMirror>,
) -> ConfigSnapshot {
    let Some(mirror) = mirror else {
        return codec.load_configs();
    };

    match mirror.load_configs().await {
        Ok(from_mirror) if !from_mirror.is_empty() => {
            info!(guilds = from_mirror.len(), "Configs loaded from mirror");
            if let Err(e) = codec.write_configs(&from_mirror) {
                error!(error = %e, "Failed to refresh config snapshot from mirror");
            }
            from_mirror
        }
        Ok(_) => {
            let from_snapshot = codec.load_configs();
            info!(guilds = from_snapshot.len(), "Configs loaded from snapshot; seeding mirror");
            if let Err(e) = mirror.replace_configs(&from_snapshot).await {
                error!(error = %e, "Failed to seed mirror with configs");
            }
            from_snapshot
        }
        Err(e) => {
            warn!(error = %e, "Mirror unavailable; configs loaded from snapshot");
            codec.load_configs()
        }
    }
}
