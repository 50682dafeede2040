//! Host (moderator) authentication for the `/admin` routes.

use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::api::AppState;
use crate::error::ServerError;

pub async fn require_host(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ServerError> {
    verify_host_token(req.headers(), state.config.host_token.as_deref())?;
    Ok(next.run(req).await)
}

fn verify_host_token(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ServerError> {
    let Some(expected) = expected else {
        return Err(ServerError::Forbidden(
            "Moderation is disabled (no HOST_TOKEN configured)".into(),
        ));
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() || a.ct_eq(b).unwrap_u8() != 1 {
        warn!("Rejected moderation request with a bad host token");
        return Err(ServerError::Forbidden("Invalid host token".into()));
    }
    Ok(())
}
