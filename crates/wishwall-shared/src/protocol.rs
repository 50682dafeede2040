use serde::{Deserialize, Serialize};

use crate::guest::GuestStatus;
use crate::types::{GuestId, WishId};
use crate::wish::Wish;

/// Row-level change on the wishes tables, pushed over the realtime channel.
///
/// Receivers merge these by id instead of re-fetching the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WishEvent {
    /// A wish was inserted or updated (approval, like count).
    Upserted { wish: Wish },

    /// A wish was deleted (rejected by the host). `was_approved` tells
    /// whether guests could ever see it.
    Deleted {
        id: WishId,
        #[serde(default)]
        was_approved: bool,
    },

    /// The like count of a wish changed.
    LikesChanged { wish_id: WishId, likes_count: u32 },

    /// The receiver missed events and must re-fetch its list.
    Resync,
}

impl WishEvent {
    /// Whether the event may be shown on the public (unmoderated) channel.
    ///
    /// Pending wishes never leave the moderation channel, not even their ids.
    /// Like changes only concern approved wishes, so they are always
    /// forwarded.
    pub fn is_public(&self) -> bool {
        match self {
            Self::Upserted { wish } => wish.is_approved,
            Self::Deleted { was_approved, .. } => *was_approved,
            Self::LikesChanged { .. } | Self::Resync => true,
        }
    }
}

/// Body of `POST /wishes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWishRequest {
    pub guest_id: GuestId,
    pub guest_name: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of the like endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRequest {
    pub guest_id: GuestId,
    pub guest_name: String,
}

/// Authoritative like state after a like write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeState {
    pub wish_id: WishId,
    pub liked: bool,
    pub likes_count: u32,
}

/// Response of `POST /wishes/images`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUploadResponse {
    /// Object key under the storage root, e.g. `wish-images/g1-1700000000000.jpg`.
    pub path: String,
    pub public_url: String,
}

/// Body of `POST /admin/guests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGuestRequest {
    pub id: GuestId,
    pub name: String,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// Response of `POST /guests/{id}/accept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestStatusResponse {
    pub id: GuestId,
    pub status: GuestStatus,
}

/// Response of `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub max_wish_chars: usize,
    pub public_feed_limit: u32,
    pub max_image_size: usize,
    pub moderation_enabled: bool,
}
