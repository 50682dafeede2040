use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_GUEST_ID_LEN;
use crate::error::WishError;

/// Primary key of a wish row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WishId(pub Uuid);

impl WishId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WishId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WishId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WishId {
    type Err = WishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| WishError::InvalidWishId(s.to_string()))
    }
}

/// Opaque, client-held guest identifier taken from the invitation link.
///
/// Guests are not authenticated; the id is trusted as asserted. It is only
/// checked for the characters that would be unsafe once it becomes part of
/// a storage file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct GuestId(String);

impl GuestId {
    pub fn parse(raw: &str) -> Result<Self, WishError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(WishError::EmptyGuestId);
        }
        if raw.len() > MAX_GUEST_ID_LEN {
            return Err(WishError::GuestIdTooLong);
        }
        if raw.contains("..")
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(WishError::InvalidGuestId);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuestId {
    type Error = WishError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GuestId> for String {
    fn from(id: GuestId) -> Self {
        id.0
    }
}

impl std::fmt::Display for GuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_id_accepts_link_ids() {
        assert_eq!(GuestId::parse("g1").unwrap().as_str(), "g1");
        assert_eq!(GuestId::parse("  abc-123_x ").unwrap().as_str(), "abc-123_x");
    }

    #[test]
    fn test_guest_id_rejects_unsafe_ids() {
        assert_eq!(GuestId::parse(""), Err(WishError::EmptyGuestId));
        assert_eq!(GuestId::parse("../etc"), Err(WishError::InvalidGuestId));
        assert_eq!(GuestId::parse("a/b"), Err(WishError::InvalidGuestId));
        assert_eq!(GuestId::parse("a b"), Err(WishError::InvalidGuestId));
        assert_eq!(
            GuestId::parse(&"x".repeat(MAX_GUEST_ID_LEN + 1)),
            Err(WishError::GuestIdTooLong)
        );
    }

    #[test]
    fn test_guest_id_serde_validates() {
        let ok: GuestId = serde_json::from_str("\"g2\"").unwrap();
        assert_eq!(ok.as_str(), "g2");
        assert!(serde_json::from_str::<GuestId>("\"a/b\"").is_err());
    }

    #[test]
    fn test_wish_id_from_str() {
        let id = WishId::new();
        assert_eq!(id.to_string().parse::<WishId>().unwrap(), id);
        assert!("not-a-uuid".parse::<WishId>().is_err());
    }
}
