//! Player identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable player identifier.
///
/// Ids are assigned by the durable store and are always positive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(i64);

impl PlayerId {
    /// Wrap a raw id, rejecting zero and negative values.
    pub fn new(raw: i64) -> crate::Result<Self> {
        if raw <= 0 {
            return Err(crate::Error::InvalidPlayerId(format!(
                "{raw} is not a positive integer"
            )));
        }
        Ok(Self(raw))
    }

    /// Get the raw id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<PlayerId> for i64 {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a display name and return it trimmed.
pub fn validate_username(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::InvalidUsername("must not be empty".to_string()));
    }
    if trimmed.chars().count() > crate::MAX_USERNAME_LEN {
        return Err(crate::Error::InvalidUsername(format!(
            "must be at most {} characters",
            crate::MAX_USERNAME_LEN
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(crate::Error::InvalidUsername(
            "must not contain control characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_rejects_non_positive() {
        assert!(PlayerId::new(0).is_err());
        assert!(PlayerId::new(-7).is_err());
        assert_eq!(PlayerId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn player_id_serializes_as_plain_integer() {
        let id = PlayerId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    }

    #[test]
    fn username_is_trimmed() {
        assert_eq!(validate_username("  ada ").unwrap(), "ada");
    }

    #[test]
    fn username_rejects_blank_and_oversized() {
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(crate::MAX_USERNAME_LEN + 1)).is_err());
        assert!(validate_username("tab\there").is_err());
    }
}
