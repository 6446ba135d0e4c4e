//! Score deltas and game modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category tag carried by every score event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Solo,
    Team,
}

impl GameMode {
    /// Parse from string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "solo" => Ok(Self::Solo),
            "team" => Ok(Self::Team),
            other => Err(crate::Error::InvalidMode(format!(
                "unknown game mode '{other}' (expected 'solo' or 'team')"
            ))),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Team => "team",
        }
    }
}

impl FromStr for GameMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, non-negative score increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ScoreDelta(i64);

impl ScoreDelta {
    /// Validate a raw delta against the per-event ceiling.
    pub fn new(delta: i64, max: i64) -> crate::Result<Self> {
        if !(0..=max).contains(&delta) {
            return Err(crate::Error::InvalidDelta { delta, max });
        }
        Ok(Self(delta))
    }

    /// Get the raw value.
    pub fn get(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [GameMode::Solo, GameMode::Team] {
            assert_eq!(GameMode::parse(mode.as_str()).unwrap(), mode);
        }
        assert!("ranked".parse::<GameMode>().is_err());
    }

    #[test]
    fn mode_defaults_to_solo() {
        assert_eq!(GameMode::default(), GameMode::Solo);
    }

    #[test]
    fn delta_bounds_are_inclusive() {
        assert_eq!(ScoreDelta::new(0, 10).unwrap().get(), 0);
        assert_eq!(ScoreDelta::new(10, 10).unwrap().get(), 10);
        assert!(ScoreDelta::new(11, 10).is_err());
        assert!(ScoreDelta::new(-1, 10).is_err());
    }

    #[test]
    fn delta_error_mentions_ceiling() {
        let err = ScoreDelta::new(5_000_001, 5_000_000).unwrap_err();
        assert!(err.to_string().contains("between 0 and 5000000"));
    }
}
