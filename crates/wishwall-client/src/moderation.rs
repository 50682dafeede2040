//! Host-side view over every wish, pending ones included.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use wishwall_shared::{Wish, WishEvent, WishId};

use crate::backend::{EventFeed, EventStream, WishBackend};
use crate::error::Result;
use crate::merge;
use crate::notice::{Notice, Notifier};
use crate::sync::LiveList;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
}

impl StatusFilter {
    fn admits(self, wish: &Wish) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !wish.is_approved,
            Self::Approved => wish.is_approved,
        }
    }
}

/// Search box plus status tab of the moderation screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishFilter {
    pub query: String,
    pub status: StatusFilter,
}

impl WishFilter {
    pub fn matches(&self, wish: &Wish) -> bool {
        let query = self.query.trim();
        self.status.admits(wish) && (query.is_empty() || wish.matches_query(query))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WishCounts {
    pub pending: usize,
    pub approved: usize,
}

pub struct ModerationPanel<B> {
    inner: Arc<Inner<B>>,
}

struct Inner<B> {
    backend: B,
    wishes: watch::Sender<Vec<Wish>>,
    notices: Notifier,
}

impl<B> Clone for ModerationPanel<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: WishBackend> ModerationPanel<B> {
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

    pub fn wishes(&self) -> Vec<Wish> {
        self.inner.wishes.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Wish>> {
        self.inner.wishes.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub async fn fetch_all_wishes(&self) -> Result<Vec<Wish>> {
        match self.inner.backend.fetch_all().await {
            Ok(mut wishes) => {
                merge::sort_newest_first(&mut wishes);
                self.inner.wishes.send_replace(wishes.clone());
                Ok(wishes)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load wishes for moderation");
                self.inner.notices.emit(Notice::LoadFailed);
                Err(e)
            }
        }
    }

    /// Make a wish public. Approving twice is harmless.
    pub async fn approve_wish(&self, id: WishId) -> Result<Wish> {
        match self.inner.backend.approve(id).await {
            Ok(wish) => {
                info!(id = %id, "Wish approved");
                self.inner
                    .wishes
                    .send_if_modified(|list| merge::upsert(list, wish.clone()));
                self.inner.notices.emit(Notice::WishApproved);
                Ok(wish)
            }
            Err(e) => {
                warn!(error = %e, id = %id, "Failed to approve wish");
                self.inner.notices.emit(Notice::ApproveFailed);
                Err(e)
            }
        }
    }

    /// Delete a wish and its likes. There is no undo.
    pub async fn reject_wish(&self, id: WishId) -> Result<()> {
        match self.inner.backend.reject(id).await {
            Ok(()) => {
                info!(id = %id, "Wish rejected");
                self.inner
                    .wishes
                    .send_if_modified(|list| merge::remove(list, id));
                self.inner.notices.emit(Notice::WishRemoved);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = %id, "Failed to reject wish");
                self.inner.notices.emit(Notice::RemoveFailed);
                Err(e)
            }
        }
    }

    pub fn filtered(&self, filter: &WishFilter) -> Vec<Wish> {
        self.inner
            .wishes
            .borrow()
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> WishCounts {
        let wishes = self.inner.wishes.borrow();
        let approved = wishes.iter().filter(|w| w.is_approved).count();
        WishCounts {
            pending: wishes.len() - approved,
            approved,
        }
    }

    /// Merge one realtime change. Every event applies here, pending
    /// wishes included.
    pub fn apply_event(&self, event: &WishEvent) -> bool {
        self.inner.wishes.send_if_modified(|list| match event {
            WishEvent::Upserted { wish } => merge::upsert(list, wish.clone()),
            WishEvent::Deleted { id, .. } => merge::remove(list, *id),
            WishEvent::LikesChanged {
                wish_id,
                likes_count,
            } => merge::set_likes(list, *wish_id, *likes_count),
            WishEvent::Resync => false,
        })
    }
}

impl<B: WishBackend> LiveList for ModerationPanel<B> {
    async fn open_events(&self) -> Result<EventStream> {
        self.inner.backend.subscribe(EventFeed::Moderation).await
    }

    fn apply_event(&self, event: &WishEvent) -> bool {
        ModerationPanel::apply_event(self, event)
    }

    async fn refetch(&self) -> Result<()> {
        self.fetch_all_wishes().await.map(|_| ())
    }
}
