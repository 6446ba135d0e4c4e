//! Refresh coordinator tests: lease exclusivity across instances and
//! reconciliation of a drifted rank index.

mod common;

use common::*;
use podium_core::config::{AppConfig, LeaseBackendConfig};
use podium_ranking::LeaseProvider;
use podium_server::bootstrap::warm_up;
use podium_server::{AppState, tasks};
use podium_server::leaderboard::refresh::{RECONCILE_LEASE, REFRESH_LEASE};
use podium_server::leaderboard::{RefreshState, TickOutcome};
use podium_server::lease::StoreLeaseProvider;
use podium_store::repos::{LeaseRepo, StandingsRepo};
use std::time::Duration;

fn store_leased_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.refresh.lease_backend = LeaseBackendConfig::Store;
    config
}

#[tokio::test]
async fn instances_sharing_a_store_take_turns_on_the_refresh_lease() {
    let test_store = TestStore::new().await.unwrap();
    let first = AppState::new(store_leased_config(), test_store.store());
    let second = AppState::new(store_leased_config(), test_store.store());

    let player = create_player(test_store.store.as_ref(), "shared").await;
    first
        .leaderboard
        .submit_score(player.get(), 12, None)
        .await
        .unwrap();

    let held = StoreLeaseProvider::new(test_store.store())
        .try_acquire(REFRESH_LEASE, Duration::from_secs(30))
        .await
        .unwrap()
        .expect("lease is free");

    assert_eq!(first.refresh.tick().await, TickOutcome::Skipped);
    assert_eq!(second.refresh.tick().await, TickOutcome::Skipped);
    assert_eq!(first.refresh.state(), RefreshState::Idle);
    assert!(first.cache.get_top_n().await.unwrap().is_none());

    StoreLeaseProvider::new(test_store.store())
        .release(&held)
        .await
        .unwrap();

    assert_eq!(
        second.refresh.tick().await,
        TickOutcome::Refreshed { entries: 1 }
    );
    assert_eq!(
        first.refresh.tick().await,
        TickOutcome::Refreshed { entries: 1 }
    );
}

#[tokio::test]
async fn lease_is_released_after_each_tick() {
    let test_store = TestStore::new().await.unwrap();
    let state = AppState::new(store_leased_config(), test_store.store());

    assert_eq!(
        state.refresh.tick().await,
        TickOutcome::Refreshed { entries: 0 }
    );
    assert!(
        test_store
            .store
            .get_lease(REFRESH_LEASE)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn refresh_pushes_durable_totals_into_the_index() {
    let server = TestServer::new().await;
    let ids = create_players(server.store().as_ref(), 2).await;
    for (id, score) in ids.iter().zip([15, 45]) {
        server
            .state
            .leaderboard
            .submit_score(id.get(), score, None)
            .await
            .unwrap();
    }

    // An index that lost every entry, as after a failed hook.
    server.state.index.rebuild_from(Vec::new()).await.unwrap();
    assert!(server.state.index.rank_of(ids[1]).await.unwrap().is_none());

    server.state.refresh.tick().await;
    let top = server.state.index.rank_of(ids[1]).await.unwrap().unwrap();
    assert_eq!(top.rank, 1);
    assert_eq!(top.total_score, 45);
}

#[tokio::test]
async fn reconcile_heals_index_drift_and_rewrites_advisory_ranks() {
    let test_store = TestStore::new().await.unwrap();
    let state = AppState::new(store_leased_config(), test_store.store());
    let ids = create_players(test_store.store.as_ref(), 3).await;
    for (id, score) in ids.iter().zip([20, 60, 40]) {
        state
            .leaderboard
            .submit_score(id.get(), score, None)
            .await
            .unwrap();
    }

    // A stale total for one player and a missing entry for another.
    state
        .index
        .rebuild_from(vec![(ids[0], 5), (ids[1], 60)])
        .await
        .unwrap();

    let indexed = state.refresh.reconcile().await.unwrap();
    assert_eq!(indexed, 3);

    let healed = state.index.rank_of(ids[0]).await.unwrap().unwrap();
    assert_eq!(healed.total_score, 20);
    assert_eq!(healed.rank, 3);
    let restored = state.index.rank_of(ids[2]).await.unwrap().unwrap();
    assert_eq!(restored.rank, 2);

    let advisory: Vec<Option<i64>> = {
        let mut ranks = Vec::new();
        for id in &ids {
            let row = test_store.store.get_aggregate(*id).await.unwrap().unwrap();
            ranks.push(row.advisory_rank);
        }
        ranks
    };
    assert_eq!(advisory, vec![Some(3), Some(1), Some(2)]);
    assert!(
        test_store
            .store
            .get_lease(RECONCILE_LEASE)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn failed_warm_up_is_retried_until_the_index_is_built() {
    let test_store = TestStore::new().await.unwrap();
    let ids = create_players(test_store.store.as_ref(), 2).await;
    let seeding = AppState::new(AppConfig::for_testing(), test_store.store());
    for (id, score) in ids.iter().zip([30, 90]) {
        seeding
            .leaderboard
            .submit_score(id.get(), score, None)
            .await
            .unwrap();
    }

    let flaky = FlakyStore::failing_scans(test_store.store(), 3);
    let state = AppState::new(AppConfig::for_testing(), flaky.clone());
    assert!(warm_up(&state).await.is_err());
    assert!(!state.index.is_warm());

    let retry = tasks::spawn_warm_up_retry(state.refresh.clone(), Duration::from_millis(10));
    tokio::time::timeout(Duration::from_secs(5), retry)
        .await
        .expect("retry loop stops once a rebuild succeeds")
        .unwrap();

    assert_eq!(flaky.remaining_scan_failures(), 0);
    assert!(state.index.is_warm());
    let leader = state.index.rank_of(ids[1]).await.unwrap().unwrap();
    assert_eq!(leader.rank, 1);
    assert_eq!(leader.total_score, 90);
}
