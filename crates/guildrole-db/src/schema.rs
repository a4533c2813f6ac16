//! Mirror table definitions
//!
//! Tables are created lazily with `IF NOT EXISTS`, so running these statements
//! against an existing database is a no-op.

/// Active custom roles
pub const CREATE_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS custom_roles (
    role_id      INTEGER PRIMARY KEY,
    guild_id     INTEGER NOT NULL,
    owner_id     INTEGER NOT NULL,
    created_by   INTEGER NOT NULL,
    created_at   TEXT    NOT NULL,
    updated_at   TEXT    NOT NULL,
    name         TEXT    NOT NULL,
    color        INTEGER NOT NULL DEFAULT 0,
    icon         TEXT,
    max_members  INTEGER,
    member_meta  TEXT    NOT NULL DEFAULT '{}'
)
"#;

/// Guild lookups over active roles
pub const CREATE_ROLES_GUILD_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_custom_roles_guild_id ON custom_roles (guild_id)
"#;

/// Soft-deleted custom roles
pub const CREATE_DELETED_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS deleted_custom_roles (
    role_id      INTEGER PRIMARY KEY,
    guild_id     INTEGER NOT NULL,
    owner_id     INTEGER NOT NULL,
    created_by   INTEGER NOT NULL,
    created_at   TEXT    NOT NULL,
    updated_at   TEXT    NOT NULL,
    name         TEXT    NOT NULL,
    color        INTEGER NOT NULL DEFAULT 0,
    icon         TEXT,
    max_members  INTEGER,
    member_meta  TEXT    NOT NULL DEFAULT '{}',
    deleted_at   TEXT    NOT NULL,
    deleted_by   INTEGER NOT NULL
)
"#;

/// Guild configuration records, stored as serialized JSON
pub const CREATE_CONFIGS: &str = r#"
CREATE TABLE IF NOT EXISTS custom_role_configs (
    guild_id  INTEGER PRIMARY KEY,
    data      TEXT    NOT NULL
)
"#;

/// All statements, in execution order
pub const ALL: &[&str] = &[
    CREATE_ROLES,
    CREATE_ROLES_GUILD_INDEX,
    CREATE_DELETED_ROLES,
    CREATE_CONFIGS,
];
