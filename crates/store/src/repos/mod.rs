//! Repository traits for durable store operations.

pub mod leases;
pub mod players;
pub mod scores;
pub mod standings;

pub use leases::LeaseRepo;
pub use players::PlayerRepo;
pub use scores::ScoreRepo;
pub use standings::StandingsRepo;
