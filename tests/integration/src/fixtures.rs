//! Test fixtures and data generators
//!
//! Provides reusable ids and role entries for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use guildrole_core::entities::{MemberGrant, RoleEntry};
use guildrole_core::value_objects::Snowflake;

/// Counter for unique ids
static COUNTER: AtomicI64 = AtomicI64::new(1_000_000);

/// Get a unique Snowflake for test data
pub fn unique_id() -> Snowflake {
    Snowflake::new(COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// A guild with an owner, a moderator and a regular member
#[derive(Debug, Clone, Copy)]
pub struct GuildFixture {
    pub guild_id: Snowflake,
    pub owner_id: Snowflake,
    pub moderator_id: Snowflake,
    pub member_id: Snowflake,
}

impl GuildFixture {
    pub fn unique() -> Self {
        Self {
            guild_id: unique_id(),
            owner_id: unique_id(),
            moderator_id: unique_id(),
            member_id: unique_id(),
        }
    }

    /// A fresh custom role owned by `owner_id`, created by that same member
    pub fn role_for(&self, owner_id: Snowflake, name: &str) -> RoleEntry {
        RoleEntry::new(unique_id(), self.guild_id, owner_id, owner_id, name)
    }

    /// A role with a member grant recorded by the owner
    pub fn role_with_member(&self, owner_id: Snowflake, name: &str) -> RoleEntry {
        let mut entry = self.role_for(owner_id, name).with_color(0x009b_59b6);
        entry
            .member_meta
            .insert(self.member_id, MemberGrant::by_member(owner_id));
        entry
    }
}
