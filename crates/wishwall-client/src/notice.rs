//! User-visible notifications raised by the client stores.
//!
//! A UI shows these as toasts. They are fire-and-forget: with nobody
//! subscribed they are dropped.

use tokio::sync::broadcast;
use tracing::debug;

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    InvalidWish,
    ImageUploadFailed,
    WishSubmitted,
    SubmitFailed,
    WishLiked,
    LikeFailed,
    LoadFailed,
    WishApproved,
    ApproveFailed,
    WishRemoved,
    RemoveFailed,
}

impl Notice {
    pub fn title(self) -> &'static str {
        match self {
            Self::InvalidWish => "Invalid wish",
            Self::ImageUploadFailed => "Image upload failed",
            Self::WishSubmitted => "Wish submitted",
            Self::WishLiked => "Liked!",
            Self::WishApproved => "Wish approved",
            Self::WishRemoved => "Wish removed",
            Self::SubmitFailed
            | Self::LikeFailed
            | Self::LoadFailed
            | Self::ApproveFailed
            | Self::RemoveFailed => "Error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::InvalidWish => "Please enter a wish between 1 and 280 characters.",
            Self::ImageUploadFailed => {
                "Could not upload the image, the wish will be submitted without it."
            }
            Self::WishSubmitted => "Your wish has been submitted and is awaiting approval.",
            Self::SubmitFailed => "Failed to submit wish. Please try again.",
            Self::WishLiked => "You liked this wish",
            Self::LikeFailed => "Failed to update like",
            Self::LoadFailed => "Failed to load wishes",
            Self::WishApproved => "The wish is now visible to all guests.",
            Self::ApproveFailed => "Failed to approve wish",
            Self::WishRemoved => "The wish has been deleted.",
            Self::RemoveFailed => "Failed to remove wish",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::InvalidWish
                | Self::SubmitFailed
                | Self::LikeFailed
                | Self::LoadFailed
                | Self::ApproveFailed
                | Self::RemoveFailed
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.description())
    }
}

#[derive(Clone)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub(crate) fn emit(&self, notice: Notice) {
        debug!(?notice, "notice");
        let _ = self.tx.send(notice);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}
