//! On-disk object storage for wish photos.
//!
//! Photos live under `{root}/wish-images/{guestId}-{millis}.{ext}` and are
//! served back by `GET /storage/wish-images/{name}`.

use std::path::{Component, Path, PathBuf};

use chrono::{Duration, Utc};
use image::ImageFormat;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use wishwall_shared::constants::WISH_IMAGE_PREFIX;
use wishwall_shared::protocol::ImageUploadResponse;
use wishwall_shared::wish::{file_extension, image_object_path};
use wishwall_shared::GuestId;

use crate::error::ServerError;

/// Formats accepted for wish photos.
const ALLOWED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Attempts at finding a free file name when two uploads share a millisecond.
const NAME_ATTEMPTS: i64 = 8;

/// Verify that a relative object key stays within the storage root.
fn ensure_within(base: &Path, key: &str) -> Result<PathBuf, ServerError> {
    let mut resolved = base.to_path_buf();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            _ => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: usize,
}

impl ImageStore {
    pub async fn new(
        base_path: PathBuf,
        public_base_url: &str,
        max_size: usize,
    ) -> Result<Self, ServerError> {
        let image_dir = base_path.join(WISH_IMAGE_PREFIX);
        fs::create_dir_all(&image_dir).await.map_err(|e| {
            ServerError::Storage(format!(
                "Failed to create image directory '{}': {}",
                image_dir.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Public URL of an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/storage/{key}", self.public_base_url)
    }

    /// Whether `url` points at a photo this store handed out.
    pub fn owns_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.public_url(WISH_IMAGE_PREFIX))
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
    }

    /// Store a guest's photo and return its key and public URL.
    ///
    /// The bytes must sniff as one of the allowed image formats. The client
    /// file name only contributes its extension, and only when it agrees
    /// with the sniffed format.
    pub async fn store_image(
        &self,
        guest_id: &GuestId,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<ImageUploadResponse, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty image".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::ImageTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let format = image::guess_format(data).map_err(|_| ServerError::UnsupportedImage)?;
        if !ALLOWED_FORMATS.contains(&format) {
            return Err(ServerError::UnsupportedImage);
        }
        let known = format.extensions_str();
        let ext = original_name
            .and_then(file_extension)
            .filter(|ext| known.contains(&ext.as_str()))
            .unwrap_or_else(|| known.first().copied().unwrap_or("img").to_string());

        let submitted_at = Utc::now();
        for attempt in 0..NAME_ATTEMPTS {
            let key = image_object_path(guest_id, submitted_at + Duration::milliseconds(attempt), &ext);
            let path = ensure_within(&self.base_path, &key)?;

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ServerError::Storage(format!("Failed to create {key}: {e}")));
                }
            };
            file.write_all(data)
                .await
                .map_err(|e| ServerError::Storage(format!("Failed to write {key}: {e}")))?;
            file.flush()
                .await
                .map_err(|e| ServerError::Storage(format!("Failed to write {key}: {e}")))?;

            debug!(key = %key, size = data.len(), "Stored wish image");
            return Ok(ImageUploadResponse {
                public_url: self.public_url(&key),
                path: key,
            });
        }

        Err(ServerError::Storage(format!(
            "No free file name for guest {guest_id}"
        )))
    }

    /// Read a stored photo by file name. Returns the bytes and MIME type.
    pub async fn get_image(&self, name: &str) -> Result<(Vec<u8>, &'static str), ServerError> {
        if name.contains('/') || name.contains('\\') {
            return Err(ServerError::BadRequest(
                "Path traversal detected".to_string(),
            ));
        }
        let key = format!("{WISH_IMAGE_PREFIX}/{name}");
        let path = ensure_within(&self.base_path, &key)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServerError::NotFound(format!("image {name}")));
            }
            Err(e) => {
                return Err(ServerError::Storage(format!("Failed to read {key}: {e}")));
            }
        };

        let mime = ImageFormat::from_path(&path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Ok((data, mime))
    }
}
