//! Server configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);
const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_ASSET_URL: &str = "http://localhost:5000";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Base URL of the REST backend API.
    pub api_url: String,
    /// Prefix for uploaded pictures served by the backend.
    pub asset_url: String,
    /// When set, serve from mock fixtures in this directory instead of the API.
    pub mock_dir: Option<PathBuf>,
    pub static_dir: String,
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Load from `RIDESHARE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind = try_load(&lookup, "RIDESHARE_BIND", DEFAULT_BIND);
        let cache_ttl_secs = try_load(&lookup, "RIDESHARE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS);

        Self {
            bind,
            api_url: load_string(&lookup, "RIDESHARE_API_URL", DEFAULT_API_URL),
            asset_url: load_string(&lookup, "RIDESHARE_ASSET_URL", DEFAULT_ASSET_URL)
                .trim_end_matches('/')
                .to_string(),
            mock_dir: lookup("RIDESHARE_MOCK_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            static_dir: load_string(&lookup, "RIDESHARE_STATIC_DIR", DEFAULT_STATIC_DIR),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }

    /// Full URL of an uploaded picture.
    ///
    /// Bare file names live under `/uploads/`, rooted paths are relative to
    /// the asset host and absolute URLs pass through.
    pub fn asset(&self, file: &str) -> String {
        if file.starts_with("http://") || file.starts_with("https://") {
            file.to_string()
        } else if file.starts_with('/') {
            format!("{}{}", self.asset_url, file)
        } else {
            format!("{}/uploads/{}", self.asset_url, file)
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn load_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    var(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(lookup, key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}; using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.mock_dir, None);
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("RIDESHARE_BIND", "0.0.0.0:8080"),
            ("RIDESHARE_API_URL", "https://api.example.tn/api"),
            ("RIDESHARE_ASSET_URL", "https://cdn.example.tn/"),
            ("RIDESHARE_MOCK_DIR", "data/mock"),
            ("RIDESHARE_CACHE_TTL_SECS", "5"),
        ]);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.api_url, "https://api.example.tn/api");
        assert_eq!(config.asset_url, "https://cdn.example.tn");
        assert_eq!(config.mock_dir, Some(PathBuf::from("data/mock")));
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = load(&[
            ("RIDESHARE_BIND", "not an address"),
            ("RIDESHARE_CACHE_TTL_SECS", "-3"),
            ("RIDESHARE_MOCK_DIR", "  "),
        ]);
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.mock_dir, None);
    }

    #[test]
    fn asset_urls() {
        let config = AppConfig::default();
        assert_eq!(
            config.asset("me.png"),
            "http://localhost:5000/uploads/me.png"
        );
        assert_eq!(
            config.asset("/uploads/me.png"),
            "http://localhost:5000/uploads/me.png"
        );
        assert_eq!(
            config.asset("https://img.example.tn/a.png"),
            "https://img.example.tn/a.png"
        );
    }
}
