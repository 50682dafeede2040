//! Background task keeping a wish list in step with the realtime channel.

use std::future::Future;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use wishwall_shared::WishEvent;

use crate::backend::EventStream;
use crate::error::{ClientError, Result};

/// A cached wish list that can follow realtime events.
pub trait LiveList: Clone + Send + Sync + 'static {
    fn open_events(&self) -> impl Future<Output = Result<EventStream>> + Send;

    fn apply_event(&self, event: &WishEvent) -> bool;

    /// Reload the whole list from the backend.
    fn refetch(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Subscribe `list` to its realtime channel, load it once, then apply
/// events until the channel ends. Abort the handle to stop early.
pub fn spawn_sync<L: LiveList>(list: L) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = match list.open_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Could not open realtime channel");
                return;
            }
        };

        // Subscribed first, so nothing committed after this load is missed.
        if let Err(e) = list.refetch().await {
            warn!(error = %e, "Initial load failed");
        }

        while let Some(item) = events.next().await {
            match item {
                Ok(WishEvent::Resync) => {
                    info!("Realtime channel asked for a resync");
                    if let Err(e) = list.refetch().await {
                        warn!(error = %e, "Resync failed");
                    }
                }
                Ok(event) => {
                    let changed = list.apply_event(&event);
                    debug!(changed, "Applied realtime event");
                }
                Err(ClientError::Decode(e)) => {
                    warn!(error = %e, "Skipping undecodable realtime event");
                }
                Err(e) => {
                    warn!(error = %e, "Realtime channel failed");
                    break;
                }
            }
        }
        debug!("Realtime sync stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{approved_wish, FakeBackend};
    use crate::store::WishesStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_sync_loads_then_follows_events() {
        let backend = FakeBackend::default();
        let first = backend.insert(approved_wish("first", Utc::now()));
        let store = WishesStore::new(backend);
        let mut rx = store.subscribe();

        let handle = spawn_sync(store.clone());

        rx.wait_for(|list| list.len() == 1).await.unwrap();
        assert_eq!(store.backend().calls("fetch_approved"), 1);

        store
            .backend()
            .emit(WishEvent::LikesChanged {
                wish_id: first.id,
                likes_count: 2,
            });
        rx.wait_for(|list| list.first().map(|w| w.likes_count) == Some(2))
            .await
            .unwrap();

        let second = approved_wish("second", Utc::now());
        store.backend().insert(second.clone());
        store.backend().emit(WishEvent::Resync);
        rx.wait_for(|list| list.len() == 2).await.unwrap();
        assert_eq!(store.backend().calls("fetch_approved"), 2);
        assert_eq!(store.wishes()[0].id, second.id);

        store.backend().close_events();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_gives_up_without_channel() {
        let backend = FakeBackend::default();
        backend.fail("subscribe");
        let store = WishesStore::new(backend);

        spawn_sync(store.clone()).await.unwrap();
        assert_eq!(store.backend().calls("fetch_approved"), 0);
    }
}
