use thiserror::Error;

use crate::constants::{MAX_GUEST_ID_LEN, MAX_GUEST_NAME_CHARS, MAX_WISH_CHARS};

/// Input rejected before it reaches any storage or network layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WishError {
    #[error("Wish content is empty")]
    EmptyContent,

    #[error("Wish content is {len} characters (max {})", MAX_WISH_CHARS)]
    ContentTooLong { len: usize },

    #[error("Guest id is empty")]
    EmptyGuestId,

    #[error("Guest id is longer than {} bytes", MAX_GUEST_ID_LEN)]
    GuestIdTooLong,

    #[error("Guest id contains forbidden characters")]
    InvalidGuestId,

    #[error("Guest name is empty")]
    EmptyGuestName,

    #[error("Guest name is longer than {} characters", MAX_GUEST_NAME_CHARS)]
    GuestNameTooLong,

    #[error("Invalid wish id: {0}")]
    InvalidWishId(String),
}
