//! SQLite implementation of RelationalMirror

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteArguments;
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use guildrole_core::entities::{ConfigSnapshot, DeletedRoleEntry, RegistrySnapshot, RoleEntry};
use guildrole_core::traits::{RelationalMirror, RepoResult};
use guildrole_core::value_objects::Snowflake;

use crate::mappers::{DeletedRoleInsert, RoleInsert};
use crate::models::{ConfigModel, DeletedRoleModel, RoleModel};
use crate::schema;

use super::error::map_db_error;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_role<'q>(query: SqliteQuery<'q>, role: RoleInsert<'q>) -> SqliteQuery<'q> {
    query
        .bind(role.role_id)
        .bind(role.guild_id)
        .bind(role.owner_id)
        .bind(role.created_by)
        .bind(role.created_at)
        .bind(role.updated_at)
        .bind(role.name)
        .bind(role.color)
        .bind(role.icon)
        .bind(role.max_members)
        .bind(role.member_meta)
}

/// SQLite implementation of RelationalMirror
///
/// Tables are created on the first call that touches them.
#[derive(Clone)]
pub struct SqliteMirror {
    pool: SqlitePool,
    schema_ready: std::sync::Arc<OnceCell<()>>,
}

impl SqliteMirror {
    /// Create a new SqliteMirror
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema_ready: std::sync::Arc::new(OnceCell::new()),
        }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RelationalMirror for SqliteMirror {
    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> RepoResult<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                for statement in schema::ALL {
                    sqlx::query(statement)
                        .execute(&self.pool)
                        .await
                        .map_err(map_db_error)?;
                }
                debug!("Mirror tables ready");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn load_registry(&self) -> RepoResult<RegistrySnapshot> {
        self.ensure_schema().await?;

        let roles = sqlx::query_as::<_, RoleModel>(
            r#"
            SELECT role_id, guild_id, owner_id, created_by, created_at, updated_at,
                   name, color, icon, max_members, member_meta
            FROM custom_roles
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let deleted = sqlx::query_as::<_, DeletedRoleModel>(
            r#"
            SELECT role_id, guild_id, owner_id, created_by, created_at, updated_at,
                   name, color, icon, max_members, member_meta, deleted_at, deleted_by
            FROM deleted_custom_roles
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(RegistrySnapshot {
            roles: roles
                .into_iter()
                .map(RoleEntry::from)
                .map(|entry| (entry.role_id, entry))
                .collect(),
            deleted: deleted
                .into_iter()
                .map(DeletedRoleEntry::from)
                .map(|entry| (entry.role_id(), entry))
                .collect(),
        })
    }

    #[instrument(skip(self, snapshot), fields(roles = snapshot.roles.len(), deleted = snapshot.deleted.len()))]
    async fn replace_registry(&self, snapshot: &RegistrySnapshot) -> RepoResult<()> {
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM custom_roles")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        sqlx::query("DELETE FROM deleted_custom_roles")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for entry in snapshot.roles.values() {
            let query = sqlx::query(
                r#"
                INSERT INTO custom_roles (role_id, guild_id, owner_id, created_by, created_at,
                                          updated_at, name, color, icon, max_members, member_meta)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            );
            bind_role(query, RoleInsert::new(entry))
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        for deleted in snapshot.deleted.values() {
            let insert = DeletedRoleInsert::new(deleted);
            let query = sqlx::query(
                r#"
                INSERT INTO deleted_custom_roles (role_id, guild_id, owner_id, created_by,
                                                  created_at, updated_at, name, color, icon,
                                                  max_members, member_meta, deleted_at, deleted_by)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            );
            bind_role(query, insert.role)
                .bind(insert.deleted_at)
                .bind(insert.deleted_by)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_configs(&self) -> RepoResult<ConfigSnapshot> {
        self.ensure_schema().await?;

        let rows = sqlx::query_as::<_, ConfigModel>(
            r#"
            SELECT guild_id, data FROM custom_role_configs
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| (Snowflake::new(row.guild_id), row.data.0))
            .collect())
    }

    #[instrument(skip(self, snapshot), fields(configs = snapshot.len()))]
    async fn replace_configs(&self, snapshot: &ConfigSnapshot) -> RepoResult<()> {
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM custom_role_configs")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for (guild_id, data) in snapshot {
            sqlx::query(
                r#"
                INSERT INTO custom_role_configs (guild_id, data) VALUES (?, ?)
                "#,
            )
            .bind(guild_id.into_inner())
            .bind(Json::<&Value>(data))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }
}
