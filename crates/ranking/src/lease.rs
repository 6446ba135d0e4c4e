//! Expiring mutual-exclusion leases.
//!
//! A lease is taken with an atomic set-if-absent carrying a TTL and released
//! with a holder-checked delete. A holder that crashes or hangs simply lets
//! its lease expire, so no failure mode blocks future acquisitions for longer
//! than one TTL.

use crate::error::RankingResult;
use crate::traits::CacheBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Handle to an acquired lease.
#[derive(Clone, Debug)]
pub struct Lease {
    name: String,
    token: String,
    ttl: Duration,
    acquired_at: Instant,
}

impl Lease {
    /// Create a handle with a fresh random holder token.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            token: Uuid::new_v4().to_string(),
            ttl,
            acquired_at: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifies this holder; release only succeeds for the matching token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the TTL has elapsed locally. Another holder may own the lease now.
    pub fn is_expired(&self) -> bool {
        self.acquired_at.elapsed() >= self.ttl
    }
}

/// Source of named leases.
#[async_trait]
pub trait LeaseProvider: Send + Sync {
    /// Try to take `name` for `ttl`. `None` means someone else holds it.
    async fn try_acquire(&self, name: &str, ttl: Duration) -> RankingResult<Option<Lease>>;

    /// Release a lease. Idempotent: releasing twice, after expiry, or after
    /// another holder took over is a no-op that returns `false`.
    async fn release(&self, lease: &Lease) -> RankingResult<bool>;
}

/// Leases stored as expiring keys on a [`CacheBackend`].
pub struct BackendLeaseProvider {
    backend: Arc<dyn CacheBackend>,
}

impl BackendLeaseProvider {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    fn key(name: &str) -> String {
        format!("lease:{name}")
    }
}

#[async_trait]
impl LeaseProvider for BackendLeaseProvider {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> RankingResult<Option<Lease>> {
        let lease = Lease::new(name, ttl);
        let acquired = self
            .backend
            .set_if_absent(
                &Self::key(name),
                Bytes::copy_from_slice(lease.token().as_bytes()),
                ttl,
            )
            .await?;
        Ok(acquired.then_some(lease))
    }

    async fn release(&self, lease: &Lease) -> RankingResult<bool> {
        self.backend
            .delete_if_eq(&Self::key(lease.name()), lease.token().as_bytes())
            .await
    }
}

/// Run `work` while holding lease `name`.
///
/// Returns `Ok(None)` without running `work` when the lease is held elsewhere.
/// The lease is released once `work` finishes, whatever it returned; a failed
/// release is logged and left to expire.
///
/// If `work` panics or the returned future is dropped before it completes
/// (a cancelled task, an enclosing timeout), no release is attempted and the
/// lease stays held until `ttl` runs out.
pub async fn with_lease<F, Fut, T>(
    provider: &dyn LeaseProvider,
    name: &str,
    ttl: Duration,
    work: F,
) -> RankingResult<Option<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let Some(lease) = provider.try_acquire(name, ttl).await? else {
        tracing::debug!(lease = name, "Lease held elsewhere; skipping");
        return Ok(None);
    };

    let output = work().await;

    if lease.is_expired() {
        tracing::warn!(
            lease = name,
            ttl_ms = lease.ttl().as_millis() as u64,
            "Work outlived its lease; another holder may have run concurrently"
        );
    }
    if let Err(e) = provider.release(&lease).await {
        tracing::warn!(lease = name, error = %e, "Failed to release lease; it will expire");
    }

    Ok(Some(output))
}
