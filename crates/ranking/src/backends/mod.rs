//! Ranking backends.

pub mod memory;
pub mod ordered;
