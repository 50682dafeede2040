//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use wishwall_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT, MAX_IMAGE_SIZE};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./wishwall.db`
    pub database_path: PathBuf,

    /// Root directory of the object storage (wish photos).
    /// Env: `STORAGE_PATH`
    /// Default: `./storage`
    pub storage_path: PathBuf,

    /// Externally visible base URL, used to build photo URLs.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://localhost:8080`
    pub public_base_url: String,

    /// Maximum photo size in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 5 MiB
    pub max_image_size: usize,

    /// Host bearer token. Required to access /admin/* endpoints.
    /// Env: `HOST_TOKEN`
    /// Default: empty (moderation API disabled).
    pub host_token: Option<String>,

    /// Human-readable name shown by `/info`.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Wishwall"`
    pub instance_name: String,

    /// Sustained write requests per second per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `10`
    pub rate_limit_per_sec: f64,

    /// Write burst size per client IP.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `30`
    pub rate_limit_burst: f64,

    /// Charge writes to the `X-Forwarded-For` / `X-Real-IP` address instead
    /// of the socket address. Only enable behind a reverse proxy that sets
    /// these headers.
    /// Env: `TRUST_PROXY_HEADERS`
    /// Default: `false`
    pub trust_proxy_headers: bool,
}

// Hand-written so the host token never ends up in logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("storage_path", &self.storage_path)
            .field("public_base_url", &self.public_base_url)
            .field("max_image_size", &self.max_image_size)
            .field("host_token", &self.host_token.as_ref().map(|_| "<redacted>"))
            .field("instance_name", &self.instance_name)
            .field("rate_limit_per_sec", &self.rate_limit_per_sec)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./wishwall.db"),
            storage_path: PathBuf::from("./storage"),
            public_base_url: format!("http://localhost:{DEFAULT_HTTP_PORT}"),
            max_image_size: MAX_IMAGE_SIZE,
            host_token: None,
            instance_name: APP_NAME.to_string(),
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            trust_proxy_headers: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(url) = lookup("PUBLIC_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.public_base_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid PUBLIC_BASE_URL, using default");
            }
        }

        if let Some(val) = lookup("MAX_IMAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_image_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_IMAGE_SIZE, using default"),
            }
        }

        if let Some(token) = lookup("HOST_TOKEN") {
            if !token.is_empty() {
                config.host_token = Some(token);
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(rate) = parse_positive(&lookup, "RATE_LIMIT_PER_SEC") {
            config.rate_limit_per_sec = rate;
        }

        if let Some(burst) = parse_positive(&lookup, "RATE_LIMIT_BURST") {
            config.rate_limit_burst = burst;
        }

        if let Some(val) = lookup("TRUST_PROXY_HEADERS") {
            match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.trust_proxy_headers = true,
                "0" | "false" | "no" | "" => config.trust_proxy_headers = false,
                _ => tracing::warn!(value = %val, "Invalid TRUST_PROXY_HEADERS, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid rate limit setting, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.max_image_size, MAX_IMAGE_SIZE);
        assert!(config.host_token.is_none());
        assert_eq!(config.instance_name, "Wishwall");
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn test_trust_proxy_headers() {
        assert!(config_from(&[("TRUST_PROXY_HEADERS", "true")]).trust_proxy_headers);
        assert!(config_from(&[("TRUST_PROXY_HEADERS", "1")]).trust_proxy_headers);
        assert!(!config_from(&[("TRUST_PROXY_HEADERS", "0")]).trust_proxy_headers);
        assert!(!config_from(&[("TRUST_PROXY_HEADERS", "maybe")]).trust_proxy_headers);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("PUBLIC_BASE_URL", "https://wedding.example.com/"),
            ("HOST_TOKEN", "s3cret"),
            ("MAX_IMAGE_SIZE", "1024"),
            ("RATE_LIMIT_BURST", "5"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.public_base_url, "https://wedding.example.com");
        assert_eq!(config.host_token.as_deref(), Some("s3cret"));
        assert_eq!(config.max_image_size, 1024);
        assert_eq!(config.rate_limit_burst, 5.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("HTTP_ADDR", "not an addr"),
            ("PUBLIC_BASE_URL", "ftp://nope"),
            ("HOST_TOKEN", ""),
            ("MAX_IMAGE_SIZE", "0"),
            ("RATE_LIMIT_PER_SEC", "-3"),
        ]);
        let default = ServerConfig::default();
        assert_eq!(config.http_addr, default.http_addr);
        assert_eq!(config.public_base_url, default.public_base_url);
        assert!(config.host_token.is_none());
        assert_eq!(config.max_image_size, default.max_image_size);
        assert_eq!(config.rate_limit_per_sec, default.rate_limit_per_sec);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("HOST_TOKEN", "s3cret")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("s3cret"));
    }
}
