//! Store Integration Tests
//!
//! End-to-end runs over real snapshot files and an SQLite mirror in a temp dir.
//!
//! Run with: cargo test -p integration-tests --test store_tests

use chrono::Utc;
use guildrole_core::entities::{GuildConfigPatch, PendingRoleRequest, RoleDisplay};
use guildrole_core::traits::RelationalMirror;
use guildrole_db::{create_pool, PoolConfig, SqliteMirror};
use guildrole_store::WriteMode;
use integration_tests::{fixtures::*, wait_for_flush, TestEnv};
use serde_json::json;

async fn open_mirror(env: &TestEnv) -> SqliteMirror {
    let database = env.config().database.as_ref().expect("mirror configured");
    let pool = create_pool(&PoolConfig::from(database)).await.unwrap();
    SqliteMirror::new(pool)
}

// ============================================================================
// Role lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_delete_restore_scenario() {
    let env = TestEnv::new().unwrap();
    let store = env.start().await;
    let registry = store.registry();
    let guild = GuildFixture::unique();
    let (u1, u2) = (guild.owner_id, guild.moderator_id);

    let r1 = guild.role_for(u1, "Owls");
    registry.add_or_replace(r1.clone(), WriteMode::Checked).unwrap();
    assert_eq!(registry.find_by_owner(guild.guild_id, u1).unwrap().role_id, r1.role_id);

    let deleted = registry.delete(r1.role_id, u2).unwrap();
    assert_eq!(deleted.deleted_by, u2);
    assert!(registry.find_by_owner(guild.guild_id, u1).is_none());
    let in_bin = registry.list_deleted_by_guild(guild.guild_id);
    assert_eq!(in_bin.len(), 1);
    assert_eq!(in_bin[0].deleted_by, u2);

    registry.restore(r1.role_id, WriteMode::Checked).unwrap().unwrap();
    let listed = registry.list_by_guild(guild.guild_id);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].role_id, r1.role_id);
    assert_eq!(listed[0].owner_id, u1);
    assert!(registry.list_deleted_by_guild(guild.guild_id).is_empty());

    store.shutdown().await;
}

#[tokio::test]
async fn test_one_role_per_owner_is_enforced() {
    let env = TestEnv::snapshot_only().unwrap();
    let store = env.start().await;
    let registry = store.registry();
    let guild = GuildFixture::unique();

    registry
        .add_or_replace(guild.role_for(guild.owner_id, "First"), WriteMode::Checked)
        .unwrap();
    let err = registry
        .add_or_replace(guild.role_for(guild.owner_id, "Second"), WriteMode::Checked)
        .unwrap_err();
    assert_eq!(err.code(), "OWNER_ALREADY_HAS_ROLE");
    assert_eq!(registry.list_by_guild(guild.guild_id).len(), 1);

    registry
        .add_or_replace(guild.role_for(guild.owner_id, "Override"), WriteMode::Force)
        .unwrap();
    assert_eq!(registry.list_by_guild(guild.guild_id).len(), 2);
}

// ============================================================================
// Restart
// ============================================================================

#[tokio::test]
async fn test_state_survives_restart() {
    let env = TestEnv::new().unwrap();
    let guild = GuildFixture::unique();
    let entry = guild.role_with_member(guild.owner_id, "Night Owls");
    let gone = guild.role_for(guild.moderator_id, "Larks");

    {
        let store = env.start().await;
        let registry = store.registry();
        registry.add_or_replace(entry.clone(), WriteMode::Checked).unwrap();
        registry.add_or_replace(gone.clone(), WriteMode::Checked).unwrap();
        registry.delete(gone.role_id, guild.owner_id);
        store.configs().update(
            guild.guild_id,
            GuildConfigPatch {
                manager_role_ids: Some(vec![unique_id()]),
                top_enabled: Some(true),
                ..Default::default()
            },
        );
        store.shutdown().await;
    }

    let store = env.start().await;
    let registry = store.registry();
    assert_eq!(registry.get(entry.role_id), Some(entry.clone()));
    assert_eq!(registry.get_deleted(gone.role_id).unwrap().entry, gone);
    assert_eq!(registry.list_by_guild(guild.guild_id), vec![entry]);

    let config = store.configs().get(guild.guild_id);
    assert!(config.top_enabled);
    assert_eq!(config.manager_role_ids.len(), 1);
}

#[tokio::test]
async fn test_crash_before_quiet_period_loses_only_recent_mutations() {
    let env = TestEnv::snapshot_only().unwrap();
    let guild = GuildFixture::unique();
    let kept = guild.role_for(guild.owner_id, "Kept");
    let lost = guild.role_for(guild.member_id, "Lost");

    let store = env.start().await;
    store.registry().add_or_replace(kept.clone(), WriteMode::Checked).unwrap();
    wait_for_flush(&store).await;

    // Mutate, then "crash": read the disk before the quiet period has passed
    store.registry().add_or_replace(lost.clone(), WriteMode::Checked).unwrap();
    let on_disk = env.disk().load_registry();

    assert!(on_disk.roles.contains_key(&kept.role_id));
    assert!(!on_disk.roles.contains_key(&lost.role_id));
}

#[tokio::test]
async fn test_snapshot_only_environment_restarts_from_files() {
    let env = TestEnv::snapshot_only().unwrap();
    let guild = GuildFixture::unique();
    let entry = guild.role_for(guild.owner_id, "Owls");

    let store = env.start().await;
    assert!(!store.has_mirror());
    store.registry().add_or_replace(entry.clone(), WriteMode::Checked).unwrap();
    wait_for_flush(&store).await;
    store.shutdown().await;

    let raw: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(env.data_dir().join("custom_roles.json")).unwrap(),
    )
    .unwrap();
    let key = entry.role_id.to_string();
    assert_eq!(raw["roles"][&key]["ownerId"], json!(guild.owner_id.to_string()));
    assert_eq!(raw["deleted"], json!({}));

    let restarted = env.start().await;
    assert_eq!(restarted.registry().get(entry.role_id), Some(entry));
}

// ============================================================================
// Mirror
// ============================================================================

#[tokio::test]
async fn test_mirror_matches_snapshot_after_flush() {
    let env = TestEnv::new().unwrap();
    let guild = GuildFixture::unique();

    let store = env.start().await;
    let registry = store.registry();
    let entry = guild.role_for(guild.owner_id, "Owls");
    registry.add_or_replace(entry.clone(), WriteMode::Checked).unwrap();
    registry.update_display(
        entry.role_id,
        RoleDisplay {
            name: Some("Great Owls".into()),
            color: Some(0x00e6_7e22),
            icon: None,
        },
    );
    registry.record_member_grant(
        entry.role_id,
        guild.member_id,
        guildrole_core::entities::MemberGrant::by_bot(unique_id()),
    );
    store
        .configs()
        .open_role_request(guild.guild_id, guild.member_id, PendingRoleRequest::new("Crows"))
        .unwrap();
    wait_for_flush(&store).await;

    let mirror = open_mirror(&env).await;
    let mirrored = mirror.load_registry().await.unwrap();
    assert_eq!(mirrored, env.disk().load_registry());
    assert_eq!(mirrored.roles[&entry.role_id].name, "Great Owls");
    assert_eq!(mirror.load_configs().await.unwrap(), env.disk().load_configs());
}

#[tokio::test]
async fn test_mirror_is_source_of_truth_on_restart() {
    let env = TestEnv::new().unwrap();
    let guild = GuildFixture::unique();
    let entry = guild.role_for(guild.owner_id, "Owls");

    {
        let store = env.start().await;
        store.registry().add_or_replace(entry.clone(), WriteMode::Checked).unwrap();
        store.shutdown().await;
    }

    // Someone edits the snapshot export by hand; the mirror still wins
    std::fs::write(
        env.data_dir().join("custom_roles.json"),
        r#"{"roles":{},"deleted":{}}"#,
    )
    .unwrap();

    let store = env.start().await;
    assert_eq!(store.registry().get(entry.role_id), Some(entry.clone()));
    assert!(env.disk().load_registry().roles.contains_key(&entry.role_id));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_request_flow_and_cooldowns() {
    let env = TestEnv::new().unwrap();
    let guild = GuildFixture::unique();
    let store = env.start().await;
    let configs = store.configs();

    configs
        .open_role_request(guild.guild_id, guild.member_id, PendingRoleRequest::new("Crows"))
        .unwrap();
    let rejected_at = Utc::now();
    let rejected = configs
        .reject_role_request(guild.guild_id, guild.member_id, rejected_at)
        .unwrap();
    assert_eq!(rejected.role_name, "Crows");
    assert!(configs
        .reject_role_request(guild.guild_id, guild.member_id, rejected_at)
        .is_none());

    configs
        .open_role_request(guild.guild_id, guild.member_id, PendingRoleRequest::new("Ravens"))
        .unwrap();
    assert!(configs.approve_role_request(guild.guild_id, guild.member_id).is_some());
    store.shutdown().await;

    let restarted = env.start().await;
    let config = restarted.configs().get(guild.guild_id);
    assert!(config.pending_requests.is_empty());
    assert_eq!(config.request_cooldowns[&guild.member_id], rejected_at);
}

#[tokio::test]
async fn test_legacy_config_record_is_migrated_on_read() {
    let env = TestEnv::snapshot_only().unwrap();
    let guild_id = unique_id();
    std::fs::write(
        env.data_dir().join("custom_role_config.json"),
        json!({ guild_id.to_string(): { "managerRoleIds": "42", "oldFlag": 1 } }).to_string(),
    )
    .unwrap();

    let store = env.start().await;
    let config = store.configs().get(guild_id);
    assert_eq!(config.manager_role_ids.len(), 1);
    assert!(config.blocked_channel_ids.is_empty());
    wait_for_flush(&store).await;

    let on_disk = env.disk().load_configs();
    let record = &on_disk[&guild_id];
    assert_eq!(record["managerRoleIds"], json!(["42"]));
    assert_eq!(record["blockedChannelIds"], json!([]));
    assert_eq!(record["pendingRequests"], json!({}));
    assert!(record["logChannelId"].is_null());
    assert_eq!(record["topEnabled"], json!(false));
    assert!(record.get("oldFlag").is_none());
}
