//! HTTP server configuration.
//!
//! Loaded from environment variables (see [`HttpConfig::from_env`]) or
//! deserialized from any serde source.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::request::Parts;
use serde::Deserialize;

/// Listen addresses, TLS material and CORS policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Plain HTTP listen address.
    pub address: String,

    /// HTTPS listen address; TLS is served only when this is set.
    pub address_tls: Option<String>,

    pub cert_file: Option<PathBuf>,

    pub key_file: Option<PathBuf>,

    /// CORS policy; no CORS layer is installed when absent.
    pub cors: Option<CorsConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0:8080"),
            address_tls: None,
            cert_file: None,
            key_file: None,
            cors: None,
        }
    }
}

impl HttpConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_ADDRESS`: plain listen address (default: 0.0.0.0:8080)
    /// - `HTTP_ADDRESS_TLS`: TLS listen address (unset disables TLS)
    /// - `HTTP_CERT_FILE` / `HTTP_KEY_FILE`: PEM certificate chain and key
    /// - `HTTP_CORS_ALLOWED_ORIGINS`: comma separated; enables CORS when set
    /// - `HTTP_CORS_ALLOWED_METHODS`, `HTTP_CORS_ALLOWED_HEADERS`,
    ///   `HTTP_CORS_EXPOSED_HEADERS`: comma separated
    /// - `HTTP_CORS_ALLOW_CREDENTIALS`: `true`/`1`
    /// - `HTTP_CORS_MAX_AGE`: preflight cache lifetime in seconds
    pub fn from_env() -> Result<Self, crate::HttpError> {
        let mut config = Self::default();

        if let Some(val) = env("HTTP_ADDRESS") {
            config.address = val;
        }
        config.address_tls = env("HTTP_ADDRESS_TLS");
        config.cert_file = env("HTTP_CERT_FILE").map(PathBuf::from);
        config.key_file = env("HTTP_KEY_FILE").map(PathBuf::from);

        if let Some(origins) = env("HTTP_CORS_ALLOWED_ORIGINS") {
            let mut cors = CorsConfig {
                allowed_origins: split_list(&origins),
                ..CorsConfig::default()
            };

            if let Some(val) = env("HTTP_CORS_ALLOWED_METHODS") {
                cors.allowed_methods = split_list(&val);
            }
            if let Some(val) = env("HTTP_CORS_ALLOWED_HEADERS") {
                cors.allowed_headers = split_list(&val);
            }
            if let Some(val) = env("HTTP_CORS_EXPOSED_HEADERS") {
                cors.exposed_headers = split_list(&val);
            }
            if let Some(val) = env("HTTP_CORS_ALLOW_CREDENTIALS") {
                cors.allow_credentials = val.eq_ignore_ascii_case("true") || val == "1";
            }
            if let Some(val) = env("HTTP_CORS_MAX_AGE") {
                cors.max_age = val.parse().map_err(|_| {
                    crate::HttpError::config(format!("Invalid HTTP_CORS_MAX_AGE: {val}"))
                })?;
            }

            config.cors = Some(cors);
        }

        Ok(config)
    }
}

/// Custom origin check: `(request, origin) -> allowed`.
#[derive(Clone)]
pub struct OriginPredicate(Arc<dyn Fn(&Parts, &str) -> bool + Send + Sync>);

impl OriginPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Parts, &str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, parts: &Parts, origin: &str) -> bool {
        (self.0)(parts, origin)
    }
}

impl core::fmt::Debug for OriginPredicate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OriginPredicate(..)")
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make cross-domain requests. `"*"` allows every
    /// origin; an entry may contain one `*` standing for zero or more
    /// characters (`http://*.example.com`). Empty allows every origin.
    pub allowed_origins: Vec<String>,

    /// When set, replaces `allowed_origins`.
    #[serde(skip)]
    pub allow_origin_fn: Option<OriginPredicate>,

    /// Methods allowed for cross-domain requests (default: GET, POST, HEAD).
    pub allowed_methods: Vec<String>,

    /// Non-simple request headers the client may send. `"*"` allows all.
    /// `Origin` is always allowed.
    pub allowed_headers: Vec<String>,

    /// Response headers exposed to the client.
    pub exposed_headers: Vec<String>,

    /// Allow cookies, HTTP auth or client certificates.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds; 0 sends no max-age.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![String::from("*")],
            allow_origin_fn: None,
            allowed_methods: vec![
                String::from("GET"),
                String::from("POST"),
                String::from("HEAD"),
            ],
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age: 0,
        }
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.address, "0.0.0.0:8080");
        assert!(config.address_tls.is_none());
        assert!(config.cors.is_none());
    }

    #[test]
    fn cors_defaults() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allowed_origins, vec!["*"]);
        assert_eq!(cors.allowed_methods, vec!["GET", "POST", "HEAD"]);
        assert!(!cors.allow_credentials);
        assert_eq!(cors.max_age, 0);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: HttpConfig = serde_json::from_value(serde_json::json!({
            "address": "127.0.0.1:9000",
            "cors": { "allowed_origins": ["https://app.example.com"], "max_age": 600 }
        }))
        .unwrap();

        assert_eq!(config.address, "127.0.0.1:9000");
        let cors = config.cors.unwrap();
        assert_eq!(cors.allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(cors.allowed_methods, vec!["GET", "POST", "HEAD"]);
        assert_eq!(cors.max_age, 600);
    }

    #[test]
    fn split_list_trims_and_drops_empty() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
    }
}
