//! Realtime change channel.
//!
//! Every committed write publishes one [`WishEvent`] on a broadcast channel.
//! HTTP subscribers receive them as server-sent events; the public stream
//! drops events about pending wishes.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use wishwall_shared::WishEvent;

/// Events buffered per subscriber before it is considered lagging.
const CHANNEL_CAPACITY: usize = 256;

/// SSE event name used for every wish event.
pub const SSE_EVENT_NAME: &str = "wish";

/// Which events a subscriber may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Host,
}

impl Audience {
    fn admits(self, event: &WishEvent) -> bool {
        match self {
            Self::Public => event.is_public(),
            Self::Host => true,
        }
    }
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<WishEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: WishEvent) {
        // Err only means nobody is listening right now.
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(receivers, "wish event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WishEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Next event for `audience`, or `None` once the hub is gone. A lagging
/// receiver gets a single `Resync` in place of everything it missed.
pub async fn next_event(
    rx: &mut broadcast::Receiver<WishEvent>,
    audience: Audience,
) -> Option<WishEvent> {
    loop {
        match rx.recv().await {
            Ok(event) if audience.admits(&event) => return Some(event),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "realtime subscriber lagged, asking for resync");
                return Some(WishEvent::Resync);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Turn a subscription into an SSE body stream.
pub fn sse_stream(
    rx: broadcast::Receiver<WishEvent>,
    audience: Audience,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, move |mut rx| async move {
        loop {
            let event = next_event(&mut rx, audience).await?;
            match serde_json::to_string(&event) {
                Ok(json) => {
                    let sse = Event::default().event(SSE_EVENT_NAME).data(json);
                    return Some((Ok(sse), rx));
                }
                Err(e) => warn!(error = %e, "failed to encode wish event"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wishwall_shared::{GuestId, Wish, WishId};

    fn pending_wish() -> Wish {
        Wish::pending(GuestId::parse("g1").unwrap(), "Alice", "Hi", None)
    }

    #[tokio::test]
    async fn test_public_audience_skips_pending() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        let deleted = WishEvent::Deleted {
            id: WishId::new(),
            was_approved: true,
        };
        hub.publish(WishEvent::Upserted {
            wish: pending_wish(),
        });
        hub.publish(deleted.clone());

        assert_eq!(next_event(&mut rx, Audience::Public).await, Some(deleted));
    }

    #[tokio::test]
    async fn test_public_audience_skips_pending_deletions() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.publish(WishEvent::Deleted {
            id: WishId::new(),
            was_approved: false,
        });
        hub.publish(WishEvent::Resync);

        assert_eq!(
            next_event(&mut rx, Audience::Public).await,
            Some(WishEvent::Resync)
        );
    }

    #[tokio::test]
    async fn test_host_audience_sees_everything() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        let upsert = WishEvent::Upserted {
            wish: pending_wish(),
        };
        hub.publish(upsert.clone());
        assert_eq!(next_event(&mut rx, Audience::Host).await, Some(upsert));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        for _ in 0..CHANNEL_CAPACITY + 5 {
            hub.publish(WishEvent::Deleted {
                id: WishId::new(),
                was_approved: true,
            });
        }
        assert_eq!(
            next_event(&mut rx, Audience::Public).await,
            Some(WishEvent::Resync)
        );
    }

    #[tokio::test]
    async fn test_closed_hub_ends_stream() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        drop(hub);
        assert_eq!(next_event(&mut rx, Audience::Host).await, None);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        EventHub::new().publish(WishEvent::Resync);
    }
}
