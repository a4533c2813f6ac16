//! Guild configuration database model

use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for the custom_role_configs table
#[derive(Debug, Clone, FromRow)]
pub struct ConfigModel {
    pub guild_id: i64,
    pub data: Json<Value>,
}
