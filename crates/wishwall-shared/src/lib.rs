//! # wishwall-shared
//!
//! Types shared by the wishwall store, server and client: the wish and guest
//! models, the realtime event payloads, request/response bodies and the
//! limits every layer agrees on.

pub mod constants;
pub mod error;
pub mod guest;
pub mod protocol;
pub mod types;
pub mod wish;

pub use error::WishError;
pub use guest::{Guest, GuestStatus};
pub use protocol::WishEvent;
pub use types::{GuestId, WishId};
pub use wish::{Wish, WishLike};
