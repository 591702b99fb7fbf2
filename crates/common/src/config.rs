use std::net::SocketAddr;

use serde::Deserialize;

/// Default Etherscan account API endpoint.
pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";

/// Default block explorer used for transaction permalinks.
pub const DEFAULT_EXPLORER_URL: &str = "https://etherscan.io";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Etherscan API key. Never sent to clients.
    ///
    /// Left optional so the server still boots without it; requests then
    /// fail with a configuration error.
    pub etherscan_api_key: Option<String>,

    /// Etherscan account API endpoint
    pub etherscan_api_url: String,

    /// Block explorer base URL used to build `/tx/<hash>` links
    pub explorer_url: String,

    /// Per-call ceiling for upstream requests in seconds (default: 20)
    pub upstream_timeout_secs: u64,

    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            etherscan_api_key: std::env::var("ETHERSCAN_API_KEY").ok(),
            etherscan_api_url: std::env::var("ETHERSCAN_API_URL")
                .unwrap_or_else(|_| DEFAULT_ETHERSCAN_API_URL.to_string()),
            explorer_url: std::env::var("EXPLORER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string()),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a valid u64"))?,
            bind_addr: std::env::var("API_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_BIND_ADDR must be a valid socket address"))?,
            log_json: std::env::var("LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Returns the API key only if it looks usable.
    ///
    /// Blank values and the `PASTE_...` placeholder from sample env files
    /// count as missing.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.etherscan_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("PASTE_"))
    }
}
