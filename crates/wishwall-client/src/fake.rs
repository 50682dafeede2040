//! In-memory backend for the store tests. Counts calls per operation and
//! can be told to fail any of them.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};

use wishwall_shared::constants::PUBLIC_FEED_LIMIT;
use wishwall_shared::protocol::{ImageUploadResponse, LikeRequest, LikeState, NewWishRequest};
use wishwall_shared::wish::{file_extension, image_object_path};
use wishwall_shared::{GuestId, Wish, WishEvent, WishId};

use crate::backend::{EventFeed, EventStream, ImageUpload, WishBackend};
use crate::error::{ClientError, Result};

pub(crate) fn approved_wish(content: &str, created_at: DateTime<Utc>) -> Wish {
    let mut wish = Wish::pending(GuestId::parse("g1").unwrap(), "Alice", content, None);
    wish.is_approved = true;
    wish.created_at = created_at;
    wish.updated_at = created_at;
    wish
}

#[derive(Default)]
struct FakeState {
    wishes: Vec<Wish>,
    likes: HashSet<(WishId, GuestId)>,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
}

pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    events: Mutex<Option<broadcast::Sender<WishEvent>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(FakeState::default()),
            events: Mutex::new(Some(tx)),
        }
    }
}

impl FakeBackend {
    pub(crate) fn insert(&self, wish: Wish) -> Wish {
        self.state.lock().unwrap().wishes.push(wish.clone());
        wish
    }

    pub(crate) fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    pub(crate) fn has_like(&self, wish_id: WishId, guest_id: &GuestId) -> bool {
        self.state
            .lock()
            .unwrap()
            .likes
            .contains(&(wish_id, guest_id.clone()))
    }

    pub(crate) fn emit(&self, event: WishEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn close_events(&self) {
        self.events.lock().unwrap().take();
    }

    fn record(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(op) {
            return Err(ClientError::Status {
                status: 500,
                message: format!("{op} failed"),
            });
        }
        Ok(state)
    }

    fn like(&self, op: &'static str, id: WishId, guest_id: &GuestId, liked: Option<bool>) -> Result<LikeState> {
        let mut state = self.record(op)?;
        let FakeState { wishes, likes, .. } = &mut *state;
        let wish = wishes
            .iter_mut()
            .find(|w| w.id == id && w.is_approved)
            .ok_or_else(not_found)?;

        let key = (id, guest_id.clone());
        let liked = liked.unwrap_or(!likes.contains(&key));
        if liked {
            likes.insert(key);
        } else {
            likes.remove(&key);
        }
        wish.likes_count = likes.iter().filter(|(w, _)| *w == id).count() as u32;
        Ok(LikeState {
            wish_id: id,
            liked,
            likes_count: wish.likes_count,
        })
    }
}

fn not_found() -> ClientError {
    ClientError::Status {
        status: 404,
        message: "Not found".into(),
    }
}

fn newest_first(mut wishes: Vec<Wish>) -> Vec<Wish> {
    wishes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    wishes
}

impl WishBackend for FakeBackend {
    async fn fetch_approved(&self) -> Result<Vec<Wish>> {
        let state = self.record("fetch_approved")?;
        let approved = state.wishes.iter().filter(|w| w.is_approved).cloned().collect();
        let mut approved = newest_first(approved);
        approved.truncate(PUBLIC_FEED_LIMIT as usize);
        Ok(approved)
    }

    async fn fetch_all(&self) -> Result<Vec<Wish>> {
        let state = self.record("fetch_all")?;
        Ok(newest_first(state.wishes.clone()))
    }

    async fn upload_image(&self, guest_id: &GuestId, image: &ImageUpload) -> Result<ImageUploadResponse> {
        self.record("upload_image")?;
        let ext = file_extension(&image.file_name).unwrap_or_else(|| "jpg".into());
        let path = image_object_path(guest_id, Utc::now(), &ext);
        Ok(ImageUploadResponse {
            public_url: format!("http://fake.test/storage/{path}"),
            path,
        })
    }

    async fn submit(&self, req: &NewWishRequest) -> Result<Wish> {
        let mut state = self.record("submit")?;
        let wish = Wish::pending(
            req.guest_id.clone(),
            &req.guest_name,
            &req.content,
            req.image_url.clone(),
        );
        state.wishes.push(wish.clone());
        Ok(wish)
    }

    async fn approve(&self, id: WishId) -> Result<Wish> {
        let mut state = self.record("approve")?;
        let wish = state
            .wishes
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(not_found)?;
        wish.is_approved = true;
        Ok(wish.clone())
    }

    async fn reject(&self, id: WishId) -> Result<()> {
        let mut state = self.record("reject")?;
        let before = state.wishes.len();
        state.wishes.retain(|w| w.id != id);
        if state.wishes.len() == before {
            return Err(not_found());
        }
        state.likes.retain(|(w, _)| *w != id);
        Ok(())
    }

    async fn toggle_like(&self, id: WishId, req: &LikeRequest) -> Result<LikeState> {
        self.like("toggle_like", id, &req.guest_id, None)
    }

    async fn set_like(&self, id: WishId, req: &LikeRequest, liked: bool) -> Result<LikeState> {
        self.like("set_like", id, &req.guest_id, Some(liked))
    }

    async fn subscribe(&self, _feed: EventFeed) -> Result<EventStream> {
        drop(self.record("subscribe")?);
        let Some(rx) = self.events.lock().unwrap().as_ref().map(|tx| tx.subscribe()) else {
            return Ok(futures::stream::empty().boxed());
        };
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((Ok(event), rx)),
                Err(RecvError::Lagged(_)) => Some((Ok(WishEvent::Resync), rx)),
                Err(RecvError::Closed) => None,
            }
        })
        .boxed())
    }
}
