//! Lease contention across concurrent holders.

mod common;

use futures::future::join_all;
use podium_ranking::{
    BackendLeaseProvider, LeaseProvider, MemoryBackend, RankingError, with_lease,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_contender_wins() {
    let provider = Arc::new(BackendLeaseProvider::new(Arc::new(MemoryBackend::new())));

    let attempts = (0..16).map(|_| {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .try_acquire("refresh", Duration::from_secs(12))
                .await
                .unwrap()
        })
    });
    let winners = join_all(attempts)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();

    assert_eq!(winners, 1);
}

#[tokio::test]
async fn overlapping_with_lease_runs_work_once() {
    let provider = BackendLeaseProvider::new(Arc::new(MemoryBackend::new()));
    let runs = AtomicUsize::new(0);
    let ttl = Duration::from_secs(12);

    let runs_ref = &runs;
    let provider_ref = &provider;
    let outer = with_lease(provider_ref, "refresh", ttl, move || async move {
        runs_ref.fetch_add(1, Ordering::SeqCst);
        // A second holder arriving mid-refresh is turned away.
        with_lease(provider_ref, "refresh", ttl, move || async move {
            runs_ref.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(outer, Some(None));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn acquire_error_propagates() {
    let provider = BackendLeaseProvider::new(common::FailingBackend::new());

    let result = with_lease(&provider, "refresh", Duration::from_secs(1), || async {}).await;
    assert!(matches!(result, Err(RankingError::Unavailable(_))));
}

#[tokio::test]
async fn cancelled_work_holds_the_lease_until_it_expires() {
    let provider = BackendLeaseProvider::new(Arc::new(MemoryBackend::new()));
    let ttl = Duration::from_millis(200);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        with_lease(&provider, "reconcile", ttl, || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }),
    )
    .await;
    assert!(abandoned.is_err());

    // Nothing released it, so it is still held.
    assert!(
        provider
            .try_acquire("reconcile", ttl)
            .await
            .unwrap()
            .is_none()
    );

    tokio::time::sleep(ttl).await;
    assert!(
        provider
            .try_acquire("reconcile", ttl)
            .await
            .unwrap()
            .is_some()
    );
}
