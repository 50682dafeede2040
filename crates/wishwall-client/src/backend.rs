//! The seam between the client stores and whatever hosts the data.

use std::future::Future;

use futures::stream::BoxStream;

use wishwall_shared::protocol::{ImageUploadResponse, LikeRequest, LikeState, NewWishRequest};
use wishwall_shared::{GuestId, Wish, WishEvent, WishId};

use crate::error::Result;

/// Realtime changes as they arrive from the backend.
pub type EventStream = BoxStream<'static, Result<WishEvent>>;

/// Which realtime channel to listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFeed {
    /// Approved wishes only, plus deletions and like counts.
    Public,
    /// Every change, pending wishes included. Needs the host token.
    Moderation,
}

/// A photo picked by the guest.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait WishBackend: Send + Sync + 'static {
    /// Newest approved wishes, at most the public feed limit.
    fn fetch_approved(&self) -> impl Future<Output = Result<Vec<Wish>>> + Send;

    /// Every wish, newest first. Host only.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Wish>>> + Send;

    fn upload_image(
        &self,
        guest_id: &GuestId,
        image: &ImageUpload,
    ) -> impl Future<Output = Result<ImageUploadResponse>> + Send;

    fn submit(&self, req: &NewWishRequest) -> impl Future<Output = Result<Wish>> + Send;

    fn approve(&self, id: WishId) -> impl Future<Output = Result<Wish>> + Send;

    fn reject(&self, id: WishId) -> impl Future<Output = Result<()>> + Send;

    fn toggle_like(
        &self,
        id: WishId,
        req: &LikeRequest,
    ) -> impl Future<Output = Result<LikeState>> + Send;

    fn set_like(
        &self,
        id: WishId,
        req: &LikeRequest,
        liked: bool,
    ) -> impl Future<Output = Result<LikeState>> + Send;

    fn subscribe(&self, feed: EventFeed) -> impl Future<Output = Result<EventStream>> + Send;
}
