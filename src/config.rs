//! Configuration module for devicemap.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Default base URL of the positioning API.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Remote positioning API settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Timeout for `/devices` and the primary roster request.
    pub primary_timeout: Duration,
    /// Timeout for the secondary `/mock-devices` request.
    pub mock_timeout: Duration,
    /// Timeout for `/historical-positions`.
    pub history_timeout: Duration,
    /// Artificial delay before the in-process fallback answers.
    pub mock_latency: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            primary_timeout: Duration::from_secs(5),
            mock_timeout: Duration::from_secs(3),
            history_timeout: Duration::from_secs(5),
            mock_latency: Duration::from_millis(200),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Live-mode polling interval (default: 2s)
    pub poll_interval: Duration,
    pub api: ApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            poll_interval: Duration::from_secs(2),
            api: ApiConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DEVICEMAP_HTTP_PORT`: HTTP port (default: 8080)
    /// - `DEVICEMAP_API_URL` or `API_URL`: positioning API base URL
    ///   (default: "http://localhost:5000/api")
    /// - `DEVICEMAP_POLL_INTERVAL_MS`: live polling interval (default: 2000)
    /// - `DEVICEMAP_MOCK_LATENCY_MS`: delay of the offline fallback (default: 200)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("DEVICEMAP_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(url) = lookup("DEVICEMAP_API_URL").or_else(|| lookup("API_URL")) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                cfg.api.base_url = url.to_string();
            }
        }

        if let Some(ms) = lookup("DEVICEMAP_POLL_INTERVAL_MS").and_then(|s| s.parse::<u64>().ok()) {
            if ms > 0 {
                cfg.poll_interval = Duration::from_millis(ms);
            }
        }

        if let Some(ms) = lookup("DEVICEMAP_MOCK_LATENCY_MS").and_then(|s| s.parse::<u64>().ok()) {
            cfg.api.mock_latency = Duration::from_millis(ms);
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.api.base_url, "http://localhost:5000/api");
        assert_eq!(cfg.api.primary_timeout, Duration::from_secs(5));
        assert_eq!(cfg.api.mock_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_env_overrides() {
        let cfg = load_from(&[
            ("DEVICEMAP_HTTP_PORT", "9090"),
            ("DEVICEMAP_API_URL", "http://positions.local/api/"),
            ("DEVICEMAP_POLL_INTERVAL_MS", "500"),
        ]);
        assert_eq!(cfg.http_port, 9090);
        assert_eq!(cfg.api.base_url, "http://positions.local/api");
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_api_url_fallback_and_bad_values() {
        let cfg = load_from(&[
            ("API_URL", "http://fallback:5000/api"),
            ("DEVICEMAP_HTTP_PORT", "not-a-port"),
            ("DEVICEMAP_POLL_INTERVAL_MS", "0"),
        ]);
        assert_eq!(cfg.api.base_url, "http://fallback:5000/api");
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    }
}
