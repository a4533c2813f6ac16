//! Timestamp decoding for stored records
//!
//! Timestamps are always written as RFC 3339 strings. Snapshots written by older
//! tooling carry epoch milliseconds instead, so every stored timestamp field
//! reads both forms through these `deserialize_with` helpers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use super::Snowflake;

struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an RFC 3339 timestamp or epoch milliseconds")
    }

    fn visit_i64<E>(self, millis: i64) -> Result<DateTime<Utc>, E>
    where
        E: de::Error,
    {
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {millis}")))
    }

    fn visit_u64<E>(self, millis: u64) -> Result<DateTime<Utc>, E>
    where
        E: de::Error,
    {
        let millis = i64::try_from(millis)
            .map_err(|_| de::Error::custom(format!("timestamp out of range: {millis}")))?;
        self.visit_i64(millis)
    }

    fn visit_str<E>(self, value: &str) -> Result<DateTime<Utc>, E>
    where
        E: de::Error,
    {
        value.parse::<DateTime<Utc>>().map_err(de::Error::custom)
    }
}

/// Newtype so that containers of timestamps can reuse the visitor
struct Timestamp(DateTime<Utc>);

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TimestampVisitor).map(Timestamp)
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Timestamp::deserialize(deserializer).map(|Timestamp(at)| at)
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Timestamp>::deserialize(deserializer).map(|at| at.map(|Timestamp(at)| at))
}

pub fn deserialize_map<'de, D>(deserializer: D) -> Result<BTreeMap<Snowflake, DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<Snowflake, Timestamp>::deserialize(deserializer)
        .map(|stamps| stamps.into_iter().map(|(id, Timestamp(at))| (id, at)).collect())
}
