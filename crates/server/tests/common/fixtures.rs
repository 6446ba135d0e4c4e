//! Test fixtures for seeding players and scores.

use podium_core::PlayerId;
use podium_store::DurableStore;
use podium_store::repos::PlayerRepo;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique usernames within one test binary.
static USERNAME_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A username no other fixture call has returned.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn unique_username(prefix: &str) -> String {
    let n = USERNAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{n}")
}

#[allow(dead_code)]
pub fn pid(raw: i64) -> PlayerId {
    PlayerId::new(raw).expect("fixture player ids are positive")
}

/// Register one player and return its id.
#[allow(dead_code)]
pub async fn create_player(store: &dyn DurableStore, prefix: &str) -> PlayerId {
    store
        .create_player(&unique_username(prefix))
        .await
        .expect("Failed to create player")
        .id()
        .expect("stored id is positive")
}

/// Register `count` players and return their ids in creation order.
#[allow(dead_code)]
pub async fn create_players(store: &dyn DurableStore, count: usize) -> Vec<PlayerId> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(create_player(store, "player").await);
    }
    ids
}

/// Totals 5000, 4500, ..., 500 for ten players.
#[allow(dead_code)]
pub fn descending_totals() -> Vec<i64> {
    (0..10).map(|i| 5_000 - 500 * i).collect()
}
