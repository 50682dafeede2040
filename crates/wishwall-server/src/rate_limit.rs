//! Per-client token buckets guarding the write routes (submissions, photo
//! uploads and likes). Reads and the event streams are not limited.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::ServerConfig;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn full(burst: f64, now: Instant) -> Self {
        Self {
            tokens: burst,
            refilled_at: now,
        }
    }

    /// Take one token. On refusal, returns how long until one is available.
    fn take(&mut self, now: Instant, per_sec: f64, burst: f64) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.refilled_at).as_secs_f64();
        self.refilled_at = now;
        self.tokens = (self.tokens + elapsed * per_sec).min(burst);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / per_sec))
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    per_sec: f64,
    burst: f64,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst: burst.max(1.0),
            trust_proxy_headers: false,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            trust_proxy_headers: config.trust_proxy_headers,
            ..Self::new(config.rate_limit_per_sec, config.rate_limit_burst)
        }
    }

    async fn admit(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.burst, now))
            .take(now, self.per_sec, self.burst)
    }

    /// Forget clients that have been quiet for `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, b| now.saturating_duration_since(b.refilled_at) < max_idle);
        before - buckets.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Requests without any client address (unit tests, odd proxies) pass.
    let Some(ip) = client_ip(&req, limiter.trust_proxy_headers) else {
        return next.run(req).await;
    };

    match limiter.admit(ip).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            warn!(ip = %ip, path = %req.uri().path(), "Rate limit exceeded");
            too_many_requests(wait)
        }
    }
}

fn too_many_requests(wait: Duration) -> Response {
    let secs = wait.as_secs_f64().ceil().max(1.0) as u64;
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": "Too many requests, slow down" })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

/// The address a request is charged to.
///
/// Proxy headers are client-controlled, so they only win over the socket
/// address when `trust_proxy_headers` is set. Otherwise they are consulted
/// only when the connection carries no address at all.
fn client_ip<B>(req: &Request<B>, trust_proxy_headers: bool) -> Option<IpAddr> {
    let socket_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());

    if trust_proxy_headers {
        forwarded_ip(req).or(socket_ip)
    } else {
        socket_ip.or_else(|| forwarded_ip(req))
    }
}

fn forwarded_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
}
