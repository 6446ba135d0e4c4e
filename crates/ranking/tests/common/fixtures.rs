//! Shared test fixtures.

use podium_core::PlayerId;

#[allow(dead_code)]
pub fn pid(raw: i64) -> PlayerId {
    PlayerId::new(raw).expect("fixture player ids are positive")
}

/// Deterministic pseudo-random totals with plenty of ties.
#[allow(dead_code)]
pub fn sample_totals(players: i64) -> Vec<(PlayerId, i64)> {
    (1..=players)
        .map(|raw| (pid(raw), (raw * 7919) % 97 * 10))
        .collect()
}
