//! Guestbook operations as seen by the HTTP layer: every write goes to the
//! database first and, once committed, is published on the realtime hub.
//! Publishing happens before the database lock is released, so subscribers
//! see events in the same order as the commits.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use wishwall_shared::constants::PUBLIC_FEED_LIMIT;
use wishwall_shared::protocol::{LikeRequest, LikeState, NewGuestRequest, NewWishRequest};
use wishwall_shared::{Guest, GuestId, GuestStatus, Wish, WishEvent, WishId};
use wishwall_store::{Database, StoreError};

use crate::error::ServerError;
use crate::realtime::EventHub;

#[derive(Clone)]
pub struct WishService {
    db: Arc<Mutex<Database>>,
    events: EventHub,
}

impl WishService {
    pub fn new(db: Database, events: EventHub) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            events,
        }
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Public feed: newest approved wishes, capped.
    pub async fn approved_feed(&self) -> Result<Vec<Wish>, ServerError> {
        let db = self.db.lock().await;
        Ok(db.list_approved_wishes(PUBLIC_FEED_LIMIT)?)
    }

    /// Moderation list: every wish, uncapped.
    pub async fn all_wishes(&self) -> Result<Vec<Wish>, ServerError> {
        let db = self.db.lock().await;
        Ok(db.list_all_wishes()?)
    }

    pub async fn submit(&self, req: NewWishRequest) -> Result<Wish, ServerError> {
        let db = self.db.lock().await;
        let wish = db.submit_wish(&req.guest_id, &req.guest_name, &req.content, req.image_url)?;
        self.events.publish(WishEvent::Upserted { wish: wish.clone() });
        drop(db);

        info!(
            id = %wish.id,
            guest = %wish.guest_id,
            has_image = wish.image_url.is_some(),
            "Wish submitted, awaiting approval"
        );
        Ok(wish)
    }

    pub async fn approve(&self, id: WishId) -> Result<Wish, ServerError> {
        let db = self.db.lock().await;
        let wish = db.approve_wish(id).map_err(|e| not_found(e, id))?;
        self.events.publish(WishEvent::Upserted { wish: wish.clone() });
        drop(db);

        info!(id = %id, "Wish approved");
        Ok(wish)
    }

    /// Delete a wish for good.
    pub async fn reject(&self, id: WishId) -> Result<(), ServerError> {
        let db = self.db.lock().await;
        let wish = db.get_wish(id).map_err(|e| not_found(e, id))?;
        if !db.delete_wish(id)? {
            return Err(ServerError::NotFound(format!("wish {id}")));
        }
        self.events.publish(WishEvent::Deleted {
            id,
            was_approved: wish.is_approved,
        });
        drop(db);

        info!(id = %id, "Wish rejected and deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, id: WishId, req: &LikeRequest) -> Result<LikeState, ServerError> {
        let mut db = self.db.lock().await;
        let state = db
            .toggle_like(id, &req.guest_id, &req.guest_name)
            .map_err(|e| not_found(e, id))?;
        self.publish_likes(&state);
        Ok(state)
    }

    pub async fn set_like(
        &self,
        id: WishId,
        req: &LikeRequest,
        liked: bool,
    ) -> Result<LikeState, ServerError> {
        let mut db = self.db.lock().await;
        let state = db
            .set_like(id, &req.guest_id, &req.guest_name, liked)
            .map_err(|e| not_found(e, id))?;
        self.publish_likes(&state);
        Ok(state)
    }

    /// Callers hold the database lock, so events go out in commit order.
    fn publish_likes(&self, state: &LikeState) {
        self.events.publish(WishEvent::LikesChanged {
            wish_id: state.wish_id,
            likes_count: state.likes_count,
        });
    }

    pub async fn guest(&self, id: &GuestId) -> Result<Guest, ServerError> {
        let db = self.db.lock().await;
        db.get_guest(id).map_err(|e| match e {
            StoreError::NotFound => ServerError::NotFound(format!("guest {id}")),
            other => other.into(),
        })
    }

    pub async fn register_guest(&self, req: NewGuestRequest) -> Result<Guest, ServerError> {
        let db = self.db.lock().await;
        let guest = db.upsert_guest(&req.id, &req.name, req.mobile.as_deref())?;
        info!(guest = %guest.id, "Guest registered");
        Ok(guest)
    }

    pub async fn accept_invitation(&self, id: &GuestId) -> Result<Guest, ServerError> {
        let db = self.db.lock().await;
        let guest = db
            .set_guest_status(id, GuestStatus::Accepted)
            .map_err(|e| match e {
                StoreError::NotFound => ServerError::NotFound(format!("guest {id}")),
                other => other.into(),
            })?;
        info!(guest = %guest.id, "Invitation accepted");
        Ok(guest)
    }
}

fn not_found(e: StoreError, id: WishId) -> ServerError {
    match e {
        StoreError::NotFound => ServerError::NotFound(format!("wish {id}")),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{next_event, Audience};

    fn service() -> WishService {
        WishService::new(Database::open_in_memory().unwrap(), EventHub::new())
    }

    fn new_wish(content: &str) -> NewWishRequest {
        NewWishRequest {
            guest_id: GuestId::parse("g1").unwrap(),
            guest_name: "Alice".into(),
            content: content.into(),
            image_url: None,
        }
    }

    fn like_by(guest: &str) -> LikeRequest {
        LikeRequest {
            guest_id: GuestId::parse(guest).unwrap(),
            guest_name: guest.to_uppercase(),
        }
    }

    #[tokio::test]
    async fn test_moderation_flow_publishes_events() {
        let svc = service();
        let mut public = svc.events().subscribe();
        let mut host = svc.events().subscribe();

        let wish = svc.submit(new_wish("Congratulations!")).await.unwrap();
        assert!(svc.approved_feed().await.unwrap().is_empty());

        let approved = svc.approve(wish.id).await.unwrap();
        assert!(approved.is_approved);
        assert_eq!(svc.approved_feed().await.unwrap(), vec![approved.clone()]);

        // the pending insert is hidden from the public stream
        assert_eq!(
            next_event(&mut public, Audience::Public).await,
            Some(WishEvent::Upserted { wish: approved.clone() })
        );
        assert_eq!(
            next_event(&mut host, Audience::Host).await,
            Some(WishEvent::Upserted { wish })
        );

        svc.reject(approved.id).await.unwrap();
        assert_eq!(
            next_event(&mut public, Audience::Public).await,
            Some(WishEvent::Deleted {
                id: approved.id,
                was_approved: true
            })
        );
        assert!(svc.approved_feed().await.unwrap().is_empty());
        assert!(svc.all_wishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_twice_is_not_found() {
        let svc = service();
        let wish = svc.submit(new_wish("Hello")).await.unwrap();
        svc.reject(wish.id).await.unwrap();
        assert!(matches!(
            svc.reject(wish.id).await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_events_carry_counts() {
        let svc = service();
        let wish = svc.submit(new_wish("Hello")).await.unwrap();
        svc.approve(wish.id).await.unwrap();
        let mut rx = svc.events().subscribe();

        let state = svc.toggle_like(wish.id, &like_by("g2")).await.unwrap();
        assert_eq!(state.likes_count, 1);
        assert_eq!(
            next_event(&mut rx, Audience::Public).await,
            Some(WishEvent::LikesChanged {
                wish_id: wish.id,
                likes_count: 1
            })
        );

        let state = svc.set_like(wish.id, &like_by("g2"), false).await.unwrap();
        assert_eq!(state.likes_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_events_follow_commit_order_under_concurrency() {
        let svc = service();
        let id = svc.submit(new_wish("Hello")).await.unwrap().id;
        svc.approve(id).await.unwrap();

        for round in 0..20u32 {
            let mut rx = svc.events().subscribe();
            let tasks: Vec<_> = (0..32)
                .map(|i| {
                    let svc = svc.clone();
                    let guest = format!("r{round}-g{i}");
                    tokio::spawn(async move {
                        svc.toggle_like(id, &like_by(&guest)).await.unwrap()
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }

            let mut last = None;
            while let Ok(event) = rx.try_recv() {
                if let WishEvent::LikesChanged { likes_count, .. } = event {
                    last = Some(likes_count);
                }
            }
            let stored = svc.approved_feed().await.unwrap()[0].likes_count;
            assert_eq!(stored, 32 * (round + 1));
            assert_eq!(last, Some(stored), "round {round}");
        }
    }

    #[tokio::test]
    async fn test_rejecting_pending_wish_stays_off_public_stream() {
        let svc = service();
        let mut public = svc.events().subscribe();
        let mut host = svc.events().subscribe();

        let wish = svc.submit(new_wish("Hello")).await.unwrap();
        svc.reject(wish.id).await.unwrap();
        svc.events().publish(WishEvent::Resync);

        assert_eq!(
            next_event(&mut public, Audience::Public).await,
            Some(WishEvent::Resync)
        );
        assert_eq!(
            next_event(&mut host, Audience::Host).await,
            Some(WishEvent::Upserted { wish: wish.clone() })
        );
        assert_eq!(
            next_event(&mut host, Audience::Host).await,
            Some(WishEvent::Deleted {
                id: wish.id,
                was_approved: false
            })
        );
    }

    #[tokio::test]
    async fn test_like_on_pending_wish_is_not_found() {
        let svc = service();
        let wish = svc.submit(new_wish("Hello")).await.unwrap();
        assert!(matches!(
            svc.toggle_like(wish.id, &like_by("g2")).await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.submit(new_wish("")).await,
            Err(ServerError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_guest_rsvp() {
        let svc = service();
        let id = GuestId::parse("g7").unwrap();
        assert!(matches!(svc.guest(&id).await, Err(ServerError::NotFound(_))));

        svc.register_guest(NewGuestRequest {
            id: id.clone(),
            name: "Priya".into(),
            mobile: None,
        })
        .await
        .unwrap();
        let guest = svc.accept_invitation(&id).await.unwrap();
        assert!(guest.has_accepted());
        assert_eq!(svc.guest(&id).await.unwrap().name, "Priya");
    }
}
