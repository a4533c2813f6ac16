//! Guild configuration - per-community settings for the custom role feature
//!
//! Records are stored as raw JSON and normalized into [`GuildConfig`] on read.
//! Normalization fills in fields that older records lack, so it is the only
//! place that needs to know about legacy shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::value_objects::{timestamp, Snowflake};

/// A role request waiting for a manager decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRoleRequest {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub role_name: String,
}

impl PendingRoleRequest {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now(),
            message_id: None,
            channel_id: None,
            role_name: role_name.into(),
        }
    }

    /// Attach the inbox message that displays this request
    #[must_use]
    pub fn posted_at(mut self, channel_id: Snowflake, message_id: Snowflake) -> Self {
        self.channel_id = Some(channel_id);
        self.message_id = Some(message_id);
        self
    }
}

/// Per-guild configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    pub manager_role_ids: Vec<Snowflake>,
    pub manager_user_ids: Vec<Snowflake>,

    pub log_channel_id: Option<Snowflake>,
    pub requests_channel_id: Option<Snowflake>,
    pub requests_inbox_channel_id: Option<Snowflake>,
    pub admin_panel_channel_id: Option<Snowflake>,
    pub member_panel_channel_id: Option<Snowflake>,

    pub top_channel_id: Option<Snowflake>,
    pub top_message_id: Option<Snowflake>,
    pub top_image_url: Option<String>,
    pub top_enabled: bool,

    pub allowed_channel_ids: Vec<Snowflake>,
    pub blocked_channel_ids: Vec<Snowflake>,

    /// Keyed by requester id
    pub pending_requests: BTreeMap<Snowflake, PendingRoleRequest>,
    /// Keyed by member id; time of the last rejected request
    #[serde(deserialize_with = "timestamp::deserialize_map")]
    pub request_cooldowns: BTreeMap<Snowflake, DateTime<Utc>>,

    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub activity_reset_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize_map")]
    pub role_activity_reset_at: BTreeMap<Snowflake, DateTime<Utc>>,
}

/// Decodability check for one stored value
type Fits = fn(&Value) -> bool;

fn fits<T: DeserializeOwned>(value: &Value) -> bool {
    T::deserialize(value).is_ok()
}

fn fits_timestamp(value: &Value) -> bool {
    timestamp::deserialize(value).is_ok()
}

#[derive(Clone, Copy)]
enum FieldKind {
    /// Items that do not fit are dropped
    List(Fits),
    /// Keyed by id; entries with a bad key or a value that does not fit are dropped
    Map(Fits),
    /// A value that does not fit becomes null
    Nullable(Fits),
    Flag,
}

const FIELDS: &[(&str, FieldKind)] = &[
    ("managerRoleIds", FieldKind::List(fits::<Snowflake>)),
    ("managerUserIds", FieldKind::List(fits::<Snowflake>)),
    ("logChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("requestsChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("requestsInboxChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("adminPanelChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("memberPanelChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("topChannelId", FieldKind::Nullable(fits::<Snowflake>)),
    ("topMessageId", FieldKind::Nullable(fits::<Snowflake>)),
    ("topImageUrl", FieldKind::Nullable(fits::<String>)),
    ("topEnabled", FieldKind::Flag),
    ("allowedChannelIds", FieldKind::List(fits::<Snowflake>)),
    ("blockedChannelIds", FieldKind::List(fits::<Snowflake>)),
    ("pendingRequests", FieldKind::Map(fits::<PendingRoleRequest>)),
    ("requestCooldowns", FieldKind::Map(fits_timestamp)),
    ("activityResetAt", FieldKind::Nullable(fits_timestamp)),
    ("roleActivityResetAt", FieldKind::Map(fits_timestamp)),
];

/// Normalized value of one field plus the number of stored values discarded
fn normalize_field(kind: FieldKind, value: Option<&Value>) -> (Value, usize) {
    let discarded = |value: Option<&Value>| usize::from(value.is_some_and(|v| !v.is_null()));

    match (kind, value) {
        (FieldKind::List(item_fits), Some(Value::Array(items))) => {
            let kept: Vec<Value> = items.iter().filter(|item| item_fits(item)).cloned().collect();
            let dropped = items.len() - kept.len();
            (Value::Array(kept), dropped)
        }
        (FieldKind::List(item_fits), Some(scalar @ (Value::String(_) | Value::Number(_))))
            if item_fits(scalar) =>
        {
            (Value::Array(vec![scalar.clone()]), 0)
        }
        (FieldKind::List(_), other) => (Value::Array(Vec::new()), discarded(other)),

        (FieldKind::Map(value_fits), Some(Value::Object(entries))) => {
            let kept: Map<String, Value> = entries
                .iter()
                .filter(|(key, value)| Snowflake::parse(key).is_ok() && value_fits(value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            let dropped = entries.len() - kept.len();
            (Value::Object(kept), dropped)
        }
        (FieldKind::Map(_), other) => (Value::Object(Map::new()), discarded(other)),

        (FieldKind::Nullable(value_fits), Some(value)) if value.is_null() || value_fits(value) => {
            (value.clone(), 0)
        }
        (FieldKind::Nullable(_), other) => (Value::Null, discarded(other)),

        (FieldKind::Flag, Some(Value::Bool(flag))) => (Value::Bool(*flag), 0),
        (FieldKind::Flag, Some(Value::Number(n))) => {
            (Value::Bool(n.as_f64().is_some_and(|n| n != 0.0)), 0)
        }
        (FieldKind::Flag, Some(Value::String(s))) => (Value::Bool(s.eq_ignore_ascii_case("true")), 0),
        (FieldKind::Flag, _) => (Value::Bool(false), 0),
    }
}

/// Result of normalizing a stored record
#[derive(Debug, Clone)]
pub struct Normalized {
    pub config: GuildConfig,
    /// The stored form differs from the normalized one and should be written back
    pub changed: bool,
    /// Stored values that could not be decoded and were discarded
    pub dropped: usize,
}

impl GuildConfig {
    /// Normalize a raw stored record
    ///
    /// Missing lists become `[]`, a lone scalar where a list is expected becomes a
    /// one-element list, missing maps become `{}`, missing nullable scalars become
    /// `null`, and missing flags become `false`. Unknown fields are dropped.
    ///
    /// Undecodable values are discarded one at a time: a bad list item or map
    /// entry is removed and a bad nullable scalar becomes `null`, while every
    /// other field keeps its stored value.
    /// Normalizing an already normalized record reports `changed == false`.
    pub fn normalize(raw: &Value) -> Normalized {
        let empty = Map::new();
        let fields = raw.as_object().unwrap_or(&empty);
        let mut dropped = usize::from(!raw.is_object() && !raw.is_null());

        let normalized: Map<String, Value> = FIELDS
            .iter()
            .map(|(name, kind)| {
                let (value, discarded) = normalize_field(*kind, fields.get(*name));
                dropped += discarded;
                ((*name).to_string(), value)
            })
            .collect();

        // Every field was checked against its type above
        let config: GuildConfig = serde_json::from_value(Value::Object(normalized)).unwrap_or_default();
        let changed = serde_json::to_value(&config).map_or(true, |value| value != *raw);

        Normalized {
            config,
            changed,
            dropped,
        }
    }

    /// Serialize into the stored record form
    pub fn to_record(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Check whether a member may manage custom roles in this guild
    pub fn is_manager(&self, member_id: Snowflake, member_role_ids: &[Snowflake]) -> bool {
        self.manager_user_ids.contains(&member_id)
            || member_role_ids
                .iter()
                .any(|role_id| self.manager_role_ids.contains(role_id))
    }

    /// Record a new pending request
    pub fn open_request(
        &mut self,
        guild_id: Snowflake,
        requester_id: Snowflake,
        request: PendingRoleRequest,
    ) -> Result<(), DomainError> {
        if self.pending_requests.contains_key(&requester_id) {
            return Err(DomainError::RequestAlreadyPending {
                guild_id,
                requester_id,
            });
        }
        self.pending_requests.insert(requester_id, request);
        Ok(())
    }

    /// Remove a pending request after approval
    pub fn approve_request(&mut self, requester_id: Snowflake) -> Option<PendingRoleRequest> {
        self.pending_requests.remove(&requester_id)
    }

    /// Remove a pending request after rejection and start the requester's cooldown
    pub fn reject_request(
        &mut self,
        requester_id: Snowflake,
        rejected_at: DateTime<Utc>,
    ) -> Option<PendingRoleRequest> {
        let request = self.pending_requests.remove(&requester_id)?;
        self.request_cooldowns.insert(requester_id, rejected_at);
        Some(request)
    }
}

/// Shallow patch for [`GuildConfig`]
///
/// Every `Some` field replaces the whole field; map fields are not merged.
/// Nullable fields use `Some(None)` to clear the value.
#[derive(Debug, Clone, Default)]
pub struct GuildConfigPatch {
    pub manager_role_ids: Option<Vec<Snowflake>>,
    pub manager_user_ids: Option<Vec<Snowflake>>,
    pub log_channel_id: Option<Option<Snowflake>>,
    pub requests_channel_id: Option<Option<Snowflake>>,
    pub requests_inbox_channel_id: Option<Option<Snowflake>>,
    pub admin_panel_channel_id: Option<Option<Snowflake>>,
    pub member_panel_channel_id: Option<Option<Snowflake>>,
    pub top_channel_id: Option<Option<Snowflake>>,
    pub top_message_id: Option<Option<Snowflake>>,
    pub top_image_url: Option<Option<String>>,
    pub top_enabled: Option<bool>,
    pub allowed_channel_ids: Option<Vec<Snowflake>>,
    pub blocked_channel_ids: Option<Vec<Snowflake>>,
    pub pending_requests: Option<BTreeMap<Snowflake, PendingRoleRequest>>,
    pub request_cooldowns: Option<BTreeMap<Snowflake, DateTime<Utc>>>,
    pub activity_reset_at: Option<Option<DateTime<Utc>>>,
    pub role_activity_reset_at: Option<BTreeMap<Snowflake, DateTime<Utc>>>,
}

macro_rules! apply_fields {
    ($patch:ident, $config:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $config.$field = value;
            }
        )+
    };
}

impl GuildConfigPatch {
    /// Check if the patch carries no changes
    pub fn is_empty(&self) -> bool {
        self.manager_role_ids.is_none()
            && self.manager_user_ids.is_none()
            && self.log_channel_id.is_none()
            && self.requests_channel_id.is_none()
            && self.requests_inbox_channel_id.is_none()
            && self.admin_panel_channel_id.is_none()
            && self.member_panel_channel_id.is_none()
            && self.top_channel_id.is_none()
            && self.top_message_id.is_none()
            && self.top_image_url.is_none()
            && self.top_enabled.is_none()
            && self.allowed_channel_ids.is_none()
            && self.blocked_channel_ids.is_none()
            && self.pending_requests.is_none()
            && self.request_cooldowns.is_none()
            && self.activity_reset_at.is_none()
            && self.role_activity_reset_at.is_none()
    }

    /// Merge into a config, replacing each field the patch sets
    pub fn apply(self, config: &mut GuildConfig) {
        let patch = self;
        apply_fields!(
            patch,
            config,
            manager_role_ids,
            manager_user_ids,
            log_channel_id,
            requests_channel_id,
            requests_inbox_channel_id,
            admin_panel_channel_id,
            member_panel_channel_id,
            top_channel_id,
            top_message_id,
            top_image_url,
            top_enabled,
            allowed_channel_ids,
            blocked_channel_ids,
            pending_requests,
            request_cooldowns,
            activity_reset_at,
            role_activity_reset_at,
        );
    }
}
