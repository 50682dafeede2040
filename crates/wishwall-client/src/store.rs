//! Public wish feed as seen by guests.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use wishwall_shared::constants::PUBLIC_FEED_LIMIT;
use wishwall_shared::protocol::{LikeRequest, LikeState, NewWishRequest};
use wishwall_shared::wish::{validate_content, validate_guest_name};
use wishwall_shared::{GuestId, Wish, WishEvent, WishId};

use crate::backend::{EventFeed, EventStream, ImageUpload, WishBackend};
use crate::error::Result;
use crate::merge;
use crate::notice::{Notice, Notifier};
use crate::sync::LiveList;

/// Cache of the approved wishes plus the guest-side writes.
///
/// Cloning is cheap and every clone shares the same cache, so a UI can hand
/// one to each view while a [`crate::sync::spawn_sync`] task keeps it fresh.
pub struct WishesStore<B> {
    inner: Arc<Inner<B>>,
}

struct Inner<B> {
    backend: B,
    wishes: watch::Sender<Vec<Wish>>,
    notices: Notifier,
}

impl<B> Clone for WishesStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: WishBackend> WishesStore<B> {
    pub fn new(backend: B) -> Self {
        let (wishes, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                backend,
                wishes,
                notices: Notifier::new(),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Current snapshot, newest first.
    pub fn wishes(&self) -> Vec<Wish> {
        self.inner.wishes.borrow().clone()
    }

    /// Receiver that sees a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Wish>> {
        self.inner.wishes.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Replace the cache with the server's approved feed.
    pub async fn fetch_approved_wishes(&self) -> Result<Vec<Wish>> {
        match self.inner.backend.fetch_approved().await {
            Ok(mut wishes) => {
                wishes.retain(|w| w.is_approved);
                merge::sort_newest_first(&mut wishes);
                wishes.truncate(PUBLIC_FEED_LIMIT as usize);
                self.inner.wishes.send_replace(wishes.clone());
                Ok(wishes)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load wishes");
                self.inner.notices.emit(Notice::LoadFailed);
                Err(e)
            }
        }
    }

    /// Submit a wish for moderation.
    ///
    /// Input is checked before anything goes over the network. A photo that
    /// fails to upload does not block the wish; it is sent without one. The
    /// returned wish is pending and stays out of the cache.
    pub async fn submit_wish(
        &self,
        content: &str,
        guest_id: &GuestId,
        guest_name: &str,
        image: Option<ImageUpload>,
    ) -> Result<Wish> {
        if let Err(e) = validate_content(content).and_then(|_| validate_guest_name(guest_name)) {
            self.inner.notices.emit(Notice::InvalidWish);
            return Err(e.into());
        }

        let image_url = match image {
            Some(image) => match self.inner.backend.upload_image(guest_id, &image).await {
                Ok(uploaded) => Some(uploaded.public_url),
                Err(e) => {
                    warn!(error = %e, guest = %guest_id, "Image upload failed, submitting text only");
                    self.inner.notices.emit(Notice::ImageUploadFailed);
                    None
                }
            },
            None => None,
        };

        let req = NewWishRequest {
            guest_id: guest_id.clone(),
            guest_name: guest_name.trim().to_string(),
            content: content.trim().to_string(),
            image_url,
        };
        match self.inner.backend.submit(&req).await {
            Ok(wish) => {
                info!(id = %wish.id, guest = %guest_id, "Wish submitted");
                self.inner.notices.emit(Notice::WishSubmitted);
                Ok(wish)
            }
            Err(e) => {
                warn!(error = %e, guest = %guest_id, "Failed to submit wish");
                self.inner.notices.emit(Notice::SubmitFailed);
                Err(e)
            }
        }
    }

    /// Flip the guest's like. The cache takes the count the server returns.
    pub async fn toggle_like(
        &self,
        wish_id: WishId,
        guest_id: &GuestId,
        guest_name: &str,
    ) -> Result<LikeState> {
        let req = like_request(guest_id, guest_name);
        let result = self.inner.backend.toggle_like(wish_id, &req).await;
        self.adopt_like(wish_id, result)
    }

    /// Like (`true`) or unlike (`false`), whatever the current state.
    pub async fn set_like(
        &self,
        wish_id: WishId,
        guest_id: &GuestId,
        guest_name: &str,
        liked: bool,
    ) -> Result<LikeState> {
        let req = like_request(guest_id, guest_name);
        let result = self.inner.backend.set_like(wish_id, &req, liked).await;
        self.adopt_like(wish_id, result)
    }

    fn adopt_like(&self, wish_id: WishId, result: Result<LikeState>) -> Result<LikeState> {
        match result {
            Ok(state) => {
                self.inner
                    .wishes
                    .send_if_modified(|list| merge::set_likes(list, state.wish_id, state.likes_count));
                if state.liked {
                    self.inner.notices.emit(Notice::WishLiked);
                }
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, wish = %wish_id, "Failed to update like");
                self.inner.notices.emit(Notice::LikeFailed);
                Err(e)
            }
        }
    }

    /// Merge one realtime change into the cache. Returns whether the cache
    /// changed. `Resync` is left to the caller.
    pub fn apply_event(&self, event: &WishEvent) -> bool {
        self.inner.wishes.send_if_modified(|list| match event {
            WishEvent::Upserted { wish } if wish.is_approved => {
                let changed = merge::upsert(list, wish.clone());
                list.truncate(PUBLIC_FEED_LIMIT as usize);
                // an approved wish older than a full feed falls straight off
                changed && list.iter().any(|w| w.id == wish.id)
            }
            WishEvent::Upserted { wish } => merge::remove(list, wish.id),
            WishEvent::Deleted { id, .. } => merge::remove(list, *id),
            WishEvent::LikesChanged {
                wish_id,
                likes_count,
            } => merge::set_likes(list, *wish_id, *likes_count),
            WishEvent::Resync => false,
        })
    }
}

fn like_request(guest_id: &GuestId, guest_name: &str) -> LikeRequest {
    LikeRequest {
        guest_id: guest_id.clone(),
        guest_name: guest_name.trim().to_string(),
    }
}

impl<B: WishBackend> LiveList for WishesStore<B> {
    async fn open_events(&self) -> Result<EventStream> {
        self.inner.backend.subscribe(EventFeed::Public).await
    }

    fn apply_event(&self, event: &WishEvent) -> bool {
        WishesStore::apply_event(self, event)
    }

    async fn refetch(&self) -> Result<()> {
        self.fetch_approved_wishes().await.map(|_| ())
    }
}
