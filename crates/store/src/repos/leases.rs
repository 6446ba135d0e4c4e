//! Lease repository: expiring mutual exclusion in the durable store.

use crate::error::StoreResult;
use crate::models::LeaseRow;
use async_trait::async_trait;

/// Repository for named leases shared by every instance on the database.
#[async_trait]
pub trait LeaseRepo: Send + Sync {
    /// Take the lease if nobody holds it or the current holder's lease has
    /// expired at `now_ms`. Atomic set-if-absent; returns whether `holder`
    /// now owns the lease.
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        expires_at_ms: i64,
        now_ms: i64,
    ) -> StoreResult<bool>;

    /// Drop the lease if `holder` still owns it. Returns whether a row was
    /// removed; releasing an expired or stolen lease is a no-op.
    async fn release_lease(&self, name: &str, holder: &str) -> StoreResult<bool>;

    /// Current lease row, if any.
    async fn get_lease(&self, name: &str) -> StoreResult<Option<LeaseRow>>;
}
