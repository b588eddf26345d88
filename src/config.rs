//! Endpoint and timeout configuration.

/// Production resource API root.
pub const DEFAULT_BASE_URL: &str = "https://tdx.transportdata.tw/api/basic";

/// Production OAuth2 token endpoint.
pub const DEFAULT_AUTH_URL: &str =
    "https://tdx.transportdata.tw/auth/realms/TDXConnect/protocol/openid-connect/token";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TdxConfig {
    /// Root of the resource API, without trailing slash.
    pub base_url: String,
    /// Client-credentials token endpoint.
    pub auth_url: String,
    /// Per-request timeout enforced by the transport.
    pub timeout_secs: u64,
}

impl Default for TdxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TdxConfig {
    /// Reads `TDX_BASE_URL`, `TDX_AUTH_URL` and `TDX_TIMEOUT_SECS`, falling
    /// back to the production defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("TDX_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(url) = std::env::var("TDX_AUTH_URL") {
            config = config.with_auth_url(url);
        }
        if let Some(secs) = std::env::var("TDX_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config = config.with_timeout(secs);
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
