//! Ranking projection and caching layer for podium.
//!
//! This crate provides:
//! - An ordered-structure backend contract (`RankBackend`) and a key-value
//!   contract with expiry (`CacheBackend`)
//! - `MemoryBackend`, an in-process implementation of both
//! - `RankIndex`, the live rank order mirrored from durable aggregates
//! - `ResultCache`, short-TTL cached read results
//! - Expiring leases for single-writer coordination
//!
//! Everything here is a derived projection of the durable store and can be
//! rebuilt from it at any time.

pub mod backends;
pub mod cache;
pub mod error;
pub mod index;
pub mod lease;
pub mod traits;

pub use backends::memory::MemoryBackend;
pub use cache::{CacheTtls, ResultCache};
pub use error::{RankingError, RankingResult};
pub use index::{PendingRebuild, RankIndex};
pub use lease::{BackendLeaseProvider, Lease, LeaseProvider, with_lease};
pub use traits::{CacheBackend, RankBackend};
