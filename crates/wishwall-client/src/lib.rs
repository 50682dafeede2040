//! # wishwall-client
//!
//! Client side of the guestbook: the public [`WishesStore`], the host's
//! [`ModerationPanel`], the [`WishBackend`] they talk through and its HTTP
//! implementation, plus the realtime sync task. Nothing here depends on a
//! UI toolkit; views subscribe to snapshots and notices.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
mod merge;
pub mod moderation;
pub mod notice;
pub mod store;
pub mod sync;

#[cfg(test)]
mod fake;

pub use backend::{EventFeed, ImageUpload, WishBackend};
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpBackend;
pub use moderation::{ModerationPanel, StatusFilter, WishCounts, WishFilter};
pub use notice::Notice;
pub use store::WishesStore;
pub use sync::spawn_sync;

pub use wishwall_shared::guest::resolve_guest_id;

use tracing_subscriber::{fmt, EnvFilter};

/// Install a `tracing` subscriber for apps embedding the client. Respects
/// `RUST_LOG`; does nothing if a subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wishwall_client=debug,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
