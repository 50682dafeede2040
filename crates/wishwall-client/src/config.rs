/// Where the client finds the backend, and the moderator credential.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the wishwall server, e.g. `https://wishes.example.com`.
    pub base_url: String,

    /// Bearer token for the `/admin` routes. Only the host's panel needs it.
    pub host_token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            host_token: None,
        }
    }

    pub fn with_host_token(mut self, token: impl Into<String>) -> Self {
        self.host_token = Some(token.into());
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("host_token", &self.host_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
