//! Player repository.

use crate::error::StoreResult;
use crate::models::PlayerRow;
use async_trait::async_trait;
use podium_core::PlayerId;

/// Repository for player identity.
#[async_trait]
pub trait PlayerRepo: Send + Sync {
    /// Create a player. Usernames are unique; a duplicate yields `AlreadyExists`.
    async fn create_player(&self, username: &str) -> StoreResult<PlayerRow>;

    /// Get a player by ID.
    async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<PlayerRow>>;

    /// Get several players by ID. Unknown ids are skipped; order is unspecified.
    async fn get_players(&self, player_ids: &[PlayerId]) -> StoreResult<Vec<PlayerRow>>;
}
