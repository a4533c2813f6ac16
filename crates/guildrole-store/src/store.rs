//! Store facade - the single entry point injected into command handlers

use std::sync::Arc;

use tracing::{error, info, instrument};

use guildrole_common::AppConfig;
use guildrole_core::traits::RelationalMirror;
use guildrole_db::{create_pool, PoolConfig, SqliteMirror};

use crate::bootstrap;
use crate::configs::ConfigStore;
use crate::options::StoreOptions;
use crate::persistence::Persistence;
use crate::registry::RoleRegistry;
use crate::snapshot::SnapshotCodec;

/// Role registry plus guild configuration, with their durable backends
///
/// Cheap to clone. Build one at startup with [`GuildRoleStore::initialize`] or
/// [`GuildRoleStore::connect`] before serving any traffic.
#[derive(Clone)]
pub struct GuildRoleStore {
    registry: RoleRegistry,
    configs: ConfigStore,
    codec: Arc<SnapshotCodec>,
    has_mirror: bool,
}

impl GuildRoleStore {
    /// Reconcile the backends and start both flush workers
    ///
    /// Never fails: unreadable snapshots and an unreachable mirror degrade to
    /// empty or snapshot-only state, and are logged.
    #[instrument(skip_all, fields(roles_path = %options.roles_path.display(), mirror = mirror.is_some()))]
    pub async fn initialize(options: StoreOptions, mirror: Option<Arc<dyn RelationalMirror>>) -> Self {
        let codec = Arc::new(SnapshotCodec::new(&options.roles_path, &options.config_path));
        codec.ensure_files();

        let registry_snapshot = bootstrap::load_registry(&codec, mirror.as_deref()).await;
        let config_snapshot = bootstrap::load_configs(&codec, mirror.as_deref()).await;

        let registry = RoleRegistry::new(
            registry_snapshot,
            Persistence::new(codec.clone(), mirror.clone()),
            options.quiet_period,
        );
        let configs = ConfigStore::new(
            config_snapshot,
            Persistence::new(codec.clone(), mirror.clone()),
            options.quiet_period,
        );

        info!(
            roles = registry.len(),
            deleted = registry.deleted_len(),
            guilds = configs.len(),
            "Guild role store initialized"
        );

        Self {
            registry,
            configs,
            codec,
            has_mirror: mirror.is_some(),
        }
    }

    /// Build the store from application configuration
    ///
    /// Opens the SQLite mirror when `DATABASE_URL` is set. A mirror that cannot be
    /// opened is logged and the store runs snapshot-only.
    pub async fn connect(config: &AppConfig) -> Self {
        let mirror: Option<Arc<dyn RelationalMirror>> = match &config.database {
            None => None,
            Some(database) => match create_pool(&PoolConfig::from(database)).await {
                Ok(pool) => Some(Arc::new(SqliteMirror::new(pool))),
                Err(e) => {
                    error!(error = %e, "Failed to open relational mirror; running snapshot-only");
                    None
                }
            },
        };

        Self::initialize(StoreOptions::from(config), mirror).await
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    pub fn codec(&self) -> &SnapshotCodec {
        &self.codec
    }

    /// Whether writes are mirrored to a relational database
    pub fn has_mirror(&self) -> bool {
        self.has_mirror
    }

    /// Write pending changes of both stores now
    pub async fn flush_now(&self) {
        tokio::join!(self.registry.flush_now(), self.configs.flush_now());
    }

    /// Flush pending changes and stop both flush workers
    ///
    /// Mutations made after this point stay in memory only.
    pub async fn shutdown(&self) {
        tokio::join!(self.registry.shutdown(), self.configs.shutdown());
        info!("Guild role store shut down");
    }
}
