//! SQLite connection pool management

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// SQLite connection URL (`sqlite://path/to/file.db` or `sqlite::memory:`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    pub acquire_timeout: Duration,
    /// How long SQLite waits on a locked database before failing
    pub busy_timeout: Duration,
    /// Maximum idle time before a connection is closed; `None` keeps it forever
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite://data/custom_roles.db"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Private in-memory database
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is pinned
    /// to a single connection that is never recycled.
    pub fn in_memory() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            ..Default::default()
        }
    }
}

impl From<&guildrole_common::DatabaseConfig> for PoolConfig {
    fn from(config: &guildrole_common::DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections.max(1),
            ..Default::default()
        }
    }
}

/// Create a new SQLite connection pool, creating the database file if missing
pub async fn create_pool(config: &PoolConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .busy_timeout(config.busy_timeout);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(None)
        .connect_with(options)
        .await
}
