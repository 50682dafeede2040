/// Application name
pub const APP_NAME: &str = "Wishwall";

/// Maximum wish length in characters
pub const MAX_WISH_CHARS: usize = 280;

/// Number of approved wishes returned by the public feed
pub const PUBLIC_FEED_LIMIT: u32 = 50;

/// Maximum guest id length (ids end up in storage file names)
pub const MAX_GUEST_ID_LEN: usize = 64;

/// Maximum guest display name length in characters
pub const MAX_GUEST_NAME_CHARS: usize = 100;

/// Object storage prefix for wish photos
pub const WISH_IMAGE_PREFIX: &str = "wish-images";

/// Maximum wish photo size in bytes (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Path segment that precedes the guest id on the invitation page
pub const INVITATION_SEGMENT: &str = "invitation";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;
