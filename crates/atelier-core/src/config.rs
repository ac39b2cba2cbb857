//! Client configuration resolved from the environment.

use std::time::Duration;

pub const API_URL_ENV: &str = "ATELIER_API_URL";
pub const TIMEOUT_ENV: &str = "ATELIER_HTTP_TIMEOUT_SECS";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend host, without trailing slash (e.g. `http://localhost:5000`).
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Resolve from `ATELIER_API_URL` and `ATELIER_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            base_url,
            request_timeout,
        }
    }

    /// Same settings against another host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// `{base}/api/workshops`
    pub fn workshops_url(&self) -> String {
        format!("{}/api/workshops", self.base_url)
    }

    /// `{base}/api/notifications`
    pub fn notifications_url(&self) -> String {
        format!("{}/api/notifications", self.base_url)
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let config = ClientConfig::new("https://api.example.org/");
        assert_eq!(config.base_url, "https://api.example.org");
        assert_eq!(config.workshops_url(), "https://api.example.org/api/workshops");
        assert_eq!(
            config.notifications_url(),
            "https://api.example.org/api/notifications"
        );

        let moved = config.with_base_url("http://127.0.0.1:9000/");
        assert_eq!(moved.base_url, "http://127.0.0.1:9000");
        assert_eq!(moved.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_env_defaults() {
        std::env::remove_var(API_URL_ENV);
        std::env::set_var(TIMEOUT_ENV, "5");
        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        std::env::set_var(API_URL_ENV, "  ");
        assert_eq!(ClientConfig::from_env().base_url, DEFAULT_API_URL);

        std::env::set_var(API_URL_ENV, "http://backend:8080//");
        assert_eq!(ClientConfig::from_env().base_url, "http://backend:8080");

        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(TIMEOUT_ENV);
    }
}
