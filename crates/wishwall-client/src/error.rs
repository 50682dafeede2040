use thiserror::Error;

use wishwall_shared::WishError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Invalid(#[from] WishError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid server response: {0}")]
    Decode(String),

    #[error("No host token configured")]
    NoHostToken,
}

pub type Result<T> = std::result::Result<T, ClientError>;
