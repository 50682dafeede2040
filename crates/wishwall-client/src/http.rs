//! [`WishBackend`] over the wishwall server's HTTP API.

use std::collections::VecDeque;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use wishwall_shared::protocol::{
    GuestStatusResponse, ImageUploadResponse, LikeRequest, LikeState, NewGuestRequest,
    NewWishRequest, ServerInfo,
};
use wishwall_shared::{Guest, GuestId, Wish, WishEvent, WishId};

use crate::backend::{EventFeed, EventStream, ImageUpload, WishBackend};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Instance name and limits, as advertised by `/info`.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        read_json(self.request(Method::GET, "/info").send().await?).await
    }

    /// Guest record behind an invitation link.
    pub async fn guest(&self, id: &GuestId) -> Result<Guest> {
        read_json(self.request(Method::GET, &format!("/guests/{id}")).send().await?).await
    }

    /// Record that the guest accepted the invitation.
    pub async fn accept_invitation(&self, id: &GuestId) -> Result<GuestStatusResponse> {
        let path = format!("/guests/{id}/accept");
        read_json(self.request(Method::POST, &path).send().await?).await
    }

    pub async fn register_guest(&self, req: &NewGuestRequest) -> Result<Guest> {
        read_json(self.host_request(Method::POST, "/admin/guests")?.json(req).send().await?).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(path))
    }

    fn host_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.config.host_token.as_deref().ok_or(ClientError::NoHostToken)?;
        Ok(self.request(method, path).bearer_auth(token))
    }
}

impl WishBackend for HttpBackend {
    async fn fetch_approved(&self) -> Result<Vec<Wish>> {
        read_json(self.request(Method::GET, "/wishes").send().await?).await
    }

    async fn fetch_all(&self) -> Result<Vec<Wish>> {
        read_json(self.host_request(Method::GET, "/admin/wishes")?.send().await?).await
    }

    async fn upload_image(
        &self,
        guest_id: &GuestId,
        image: &ImageUpload,
    ) -> Result<ImageUploadResponse> {
        let form = Form::new().text("guest_id", guest_id.to_string()).part(
            "file",
            Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
        );
        let resp = self
            .request(Method::POST, "/wishes/images")
            .multipart(form)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn submit(&self, req: &NewWishRequest) -> Result<Wish> {
        read_json(self.request(Method::POST, "/wishes").json(req).send().await?).await
    }

    async fn approve(&self, id: WishId) -> Result<Wish> {
        let path = format!("/admin/wishes/{id}/approve");
        read_json(self.host_request(Method::POST, &path)?.send().await?).await
    }

    async fn reject(&self, id: WishId) -> Result<()> {
        let path = format!("/admin/wishes/{id}");
        check_status(self.host_request(Method::DELETE, &path)?.send().await?).await?;
        Ok(())
    }

    async fn toggle_like(&self, id: WishId, req: &LikeRequest) -> Result<LikeState> {
        let path = format!("/wishes/{id}/like/toggle");
        read_json(self.request(Method::POST, &path).json(req).send().await?).await
    }

    async fn set_like(&self, id: WishId, req: &LikeRequest, liked: bool) -> Result<LikeState> {
        let method = if liked { Method::PUT } else { Method::DELETE };
        let path = format!("/wishes/{id}/like");
        read_json(self.request(method, &path).json(req).send().await?).await
    }

    async fn subscribe(&self, feed: EventFeed) -> Result<EventStream> {
        let builder = match feed {
            EventFeed::Public => self.request(Method::GET, "/events"),
            EventFeed::Moderation => self.host_request(Method::GET, "/admin/events")?,
        };
        let resp = check_status(builder.header("accept", "text/event-stream").send().await?).await?;
        info!(?feed, "Realtime channel open");
        Ok(sse_events(resp))
    }
}

/// Map a non-2xx response to [`ClientError::Status`], keeping the server's
/// `{"error": ...}` message when there is one.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Largest event (or unterminated line) the decoder buffers before giving up.
const MAX_EVENT_BYTES: usize = 256 * 1024;

fn sse_events(resp: Response) -> EventStream {
    let bytes = Box::pin(resp.bytes_stream());
    futures::stream::unfold(
        (bytes, SseDecoder::default(), VecDeque::<String>::new(), false),
        |(mut bytes, mut decoder, mut ready, failed)| async move {
            if failed {
                return None;
            }
            loop {
                if let Some(data) = ready.pop_front() {
                    let event = serde_json::from_str::<WishEvent>(&data)
                        .map_err(|e| ClientError::Decode(e.to_string()));
                    return Some((event, (bytes, decoder, ready, false)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => match decoder.feed(&chunk) {
                        Ok(events) => ready.extend(events),
                        Err(e) => return Some((Err(e), (bytes, decoder, ready, true))),
                    },
                    Some(Err(e)) => return Some((Err(e.into()), (bytes, decoder, ready, false))),
                    None => {
                        debug!("Realtime channel closed by server");
                        return None;
                    }
                }
            }
        },
    )
    .boxed()
}

/// Incremental `text/event-stream` parser. Yields the `data` payload of each
/// complete event; comments (keep-alives) and other fields are skipped.
///
/// Neither a single line nor the data of one event may grow past
/// [`MAX_EVENT_BYTES`]; a peer that never terminates its lines gets a
/// [`ClientError::Decode`] instead of an ever-growing buffer.
#[derive(Debug, Default)]
struct SseDecoder {
    pending: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.pending.extend_from_slice(chunk);
        let mut complete = Vec::new();

        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c| c == '\n' || c == '\r');

            if line.is_empty() {
                complete.extend(self.data.take());
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                match &mut self.data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => self.data = Some(value.to_string()),
                }
                if self.data.as_ref().is_some_and(|d| d.len() > MAX_EVENT_BYTES) {
                    return Err(too_large());
                }
            }
        }

        if self.pending.len() > MAX_EVENT_BYTES {
            return Err(too_large());
        }
        Ok(complete)
    }
}

fn too_large() -> ClientError {
    ClientError::Decode(format!("Realtime event exceeds {MAX_EVENT_BYTES} bytes"))
}
