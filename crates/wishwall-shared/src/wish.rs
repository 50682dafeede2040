//! The wish (guestbook message) and like models plus the input rules every
//! layer applies before a wish is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_GUEST_NAME_CHARS, MAX_WISH_CHARS, WISH_IMAGE_PREFIX};
use crate::error::WishError;
use crate::types::{GuestId, WishId};

/// A guestbook message. Public only once `is_approved` is set by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wish {
    pub id: WishId,
    pub guest_id: GuestId,
    pub guest_name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: u32,
    /// Always 0: replies exist in the schema only.
    pub replies_count: u32,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wish {
    /// Build a freshly submitted, unapproved wish.
    pub fn pending(
        guest_id: GuestId,
        guest_name: &str,
        content: &str,
        image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WishId::new(),
            guest_id,
            guest_name: guest_name.trim().to_string(),
            content: content.trim().to_string(),
            image_url,
            likes_count: 0,
            replies_count: 0,
            is_approved: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match over content and guest name.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.content.to_lowercase().contains(&query)
            || self.guest_name.to_lowercase().contains(&query)
    }
}

/// One guest's like on one wish. `(wish_id, guest_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WishLike {
    pub id: Uuid,
    pub wish_id: WishId,
    pub guest_id: GuestId,
    pub guest_name: String,
    pub created_at: DateTime<Utc>,
}

/// Check wish content: 1..=280 characters, whitespace-only counts as empty.
pub fn validate_content(content: &str) -> Result<(), WishError> {
    if content.trim().is_empty() {
        return Err(WishError::EmptyContent);
    }
    let len = content.chars().count();
    if len > MAX_WISH_CHARS {
        return Err(WishError::ContentTooLong { len });
    }
    Ok(())
}

pub fn validate_guest_name(name: &str) -> Result<(), WishError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WishError::EmptyGuestName);
    }
    if name.chars().count() > MAX_GUEST_NAME_CHARS {
        return Err(WishError::GuestNameTooLong);
    }
    Ok(())
}

/// Extension of an uploaded file name, lower-cased, if it is a plain
/// alphanumeric suffix.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Storage key of a wish photo: `wish-images/{guestId}-{millis}.{ext}`.
pub fn image_object_path(guest_id: &GuestId, submitted_at: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{WISH_IMAGE_PREFIX}/{}-{}.{ext}",
        guest_id,
        submitted_at.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_content_bounds() {
        assert_eq!(validate_content(""), Err(WishError::EmptyContent));
        assert_eq!(validate_content("   \n"), Err(WishError::EmptyContent));
        assert!(validate_content("Congratulations!").is_ok());
        assert!(validate_content(&"a".repeat(MAX_WISH_CHARS)).is_ok());
        assert_eq!(
            validate_content(&"a".repeat(MAX_WISH_CHARS + 1)),
            Err(WishError::ContentTooLong {
                len: MAX_WISH_CHARS + 1
            })
        );
    }

    #[test]
    fn test_validate_content_counts_characters_not_bytes() {
        let hearts = "❤".repeat(MAX_WISH_CHARS);
        assert!(hearts.len() > MAX_WISH_CHARS);
        assert!(validate_content(&hearts).is_ok());
    }

    #[test]
    fn test_pending_wish_defaults() {
        let wish = Wish::pending(GuestId::parse("g1").unwrap(), "Alice", " Congratulations! ", None);
        assert_eq!(wish.content, "Congratulations!");
        assert_eq!(wish.guest_name, "Alice");
        assert!(!wish.is_approved);
        assert_eq!(wish.likes_count, 0);
        assert_eq!(wish.replies_count, 0);
        assert!(wish.image_url.is_none());
    }

    #[test]
    fn test_matches_query_is_case_insensitive() {
        let mut wish = Wish::pending(GuestId::parse("g1").unwrap(), "Bob", "Save me some CAKE", None);
        assert!(wish.matches_query("cake"));
        assert!(!wish.matches_query("pie"));

        wish.content = "Best wishes".into();
        wish.guest_name = "Cakeface".into();
        assert!(wish.matches_query("cake"));
    }

    #[test]
    fn test_image_object_path() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let guest = GuestId::parse("g1").unwrap();
        assert_eq!(
            image_object_path(&guest, at, "jpg"),
            "wish-images/g1-1700000000123.jpg"
        );
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("bad.ex/t"), None);
    }
}
