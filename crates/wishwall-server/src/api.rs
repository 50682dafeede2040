use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures::Stream;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use wishwall_shared::constants::{MAX_WISH_CHARS, PUBLIC_FEED_LIMIT};
use wishwall_shared::protocol::{
    GuestStatusResponse, ImageUploadResponse, LikeRequest, LikeState, NewGuestRequest,
    NewWishRequest, ServerInfo,
};
use wishwall_shared::{Guest, GuestId, Wish, WishId};

use crate::auth::require_host;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::image_store::ImageStore;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::realtime::{sse_stream, Audience};
use crate::wishes::WishService;

/// Room for the multipart framing around an image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub wishes: WishService,
    pub images: Arc<ImageStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let limited = middleware::from_fn_with_state(state.rate_limiter.clone(), rate_limit_middleware);

    let admin = Router::new()
        .route("/wishes", get(admin_list_wishes))
        .route("/wishes/:id/approve", post(admin_approve_wish))
        .route("/wishes/:id", delete(admin_reject_wish))
        .route("/events", get(admin_events))
        .route("/guests", post(admin_register_guest))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_host));

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route(
            "/wishes",
            post(submit_wish).layer(limited.clone()).get(list_public_wishes),
        )
        .route("/wishes/images", post(upload_image).layer(limited.clone()))
        .route("/wishes/:id/like/toggle", post(toggle_like).layer(limited.clone()))
        .route(
            "/wishes/:id/like",
            axum::routing::put(like_wish)
                .delete(unlike_wish)
                .layer(limited),
        )
        .route("/storage/wish-images/:name", get(serve_image))
        .route("/events", get(public_events))
        .route("/guests/:id", get(get_guest))
        .route("/guests/:id/accept", post(accept_invitation))
        .nest("/admin", admin)
        .layer(DefaultBodyLimit::max(
            state.config.max_image_size + MULTIPART_OVERHEAD,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_wish_chars: MAX_WISH_CHARS,
        public_feed_limit: PUBLIC_FEED_LIMIT,
        max_image_size: state.images.max_size(),
        moderation_enabled: state.config.host_token.is_some(),
    })
}

// ─── Public feed ───

async fn list_public_wishes(State(state): State<AppState>) -> Result<Json<Vec<Wish>>, ServerError> {
    Ok(Json(state.wishes.approved_feed().await?))
}

async fn submit_wish(
    State(state): State<AppState>,
    Json(req): Json<NewWishRequest>,
) -> Result<(StatusCode, Json<Wish>), ServerError> {
    if let Some(url) = req.image_url.as_deref() {
        if !state.images.owns_url(url) {
            return Err(ServerError::BadRequest(
                "image_url must come from /wishes/images".into(),
            ));
        }
    }
    let wish = state.wishes.submit(req).await?;
    Ok((StatusCode::CREATED, Json(wish)))
}

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ServerError> {
    let mut guest_id = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "guest_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
                guest_id = Some(GuestId::parse(&text)?);
            }
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let guest_id = guest_id.ok_or_else(|| {
        ServerError::BadRequest("Missing 'guest_id' field in multipart form".to_string())
    })?;
    let (file_name, data) = file.ok_or_else(|| {
        ServerError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let stored = state
        .images
        .store_image(&guest_id, file_name.as_deref(), &data)
        .await?;
    info!(guest = %guest_id, key = %stored.path, size = data.len(), "Wish image uploaded");
    Ok(Json(stored))
}

async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let (data, mime) = state.images.get_image(&name).await?;
    Ok(([(header::CONTENT_TYPE, mime)], data))
}

// ─── Likes ───

async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeState>, ServerError> {
    Ok(Json(state.wishes.toggle_like(id, &req).await?))
}

async fn like_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeState>, ServerError> {
    Ok(Json(state.wishes.set_like(id, &req, true).await?))
}

async fn unlike_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeState>, ServerError> {
    Ok(Json(state.wishes.set_like(id, &req, false).await?))
}

// ─── Realtime ───

fn event_stream(
    state: &AppState,
    audience: Audience,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    Sse::new(sse_stream(state.wishes.events().subscribe(), audience))
        .keep_alive(KeepAlive::default())
}

async fn public_events(State(state): State<AppState>) -> impl IntoResponse {
    event_stream(&state, Audience::Public)
}

async fn admin_events(State(state): State<AppState>) -> impl IntoResponse {
    event_stream(&state, Audience::Host)
}

// ─── Guests ───

async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Guest>, ServerError> {
    let id = GuestId::parse(&id)?;
    Ok(Json(state.wishes.guest(&id).await?))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GuestStatusResponse>, ServerError> {
    let id = GuestId::parse(&id)?;
    let guest = state.wishes.accept_invitation(&id).await?;
    Ok(Json(GuestStatusResponse {
        id: guest.id,
        status: guest.status,
    }))
}

// ─── Moderation ───

async fn admin_list_wishes(State(state): State<AppState>) -> Result<Json<Vec<Wish>>, ServerError> {
    Ok(Json(state.wishes.all_wishes().await?))
}

async fn admin_approve_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
) -> Result<Json<Wish>, ServerError> {
    Ok(Json(state.wishes.approve(id).await?))
}

async fn admin_reject_wish(
    State(state): State<AppState>,
    Path(id): Path<WishId>,
) -> Result<StatusCode, ServerError> {
    state.wishes.reject(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_register_guest(
    State(state): State<AppState>,
    Json(req): Json<NewGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), ServerError> {
    let guest = state.wishes.register_guest(req).await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
