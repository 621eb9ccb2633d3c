//! Translate a [`CorsConfig`] into a `tower_http` CORS layer.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

use crate::{CorsConfig, HttpError, Result};

/// Origin allow-list with single-wildcard patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginRules {
    allow_all: bool,
    exact: Vec<String>,
    wildcards: Vec<(String, String)>,
}

impl OriginRules {
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Self {
        let mut rules = Self {
            allow_all: origins.is_empty(),
            ..Self::default()
        };

        for origin in origins {
            let origin = origin.as_ref().trim().to_ascii_lowercase();
            if origin == "*" {
                rules.allow_all = true;
            } else if let Some((prefix, suffix)) = origin.split_once('*') {
                rules.wildcards.push((prefix.to_string(), suffix.to_string()));
            } else {
                rules.exact.push(origin);
            }
        }

        rules
    }

    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    pub fn matches(&self, origin: &str) -> bool {
        if self.allow_all {
            return true;
        }

        let origin = origin.to_ascii_lowercase();
        self.exact.iter().any(|o| *o == origin)
            || self.wildcards.iter().any(|(prefix, suffix)| {
                origin.len() >= prefix.len() + suffix.len()
                    && origin.starts_with(prefix.as_str())
                    && origin.ends_with(suffix.as_str())
            })
    }
}

/// Build the CORS layer for `config`.
///
/// With credentials enabled, wildcard origins/methods/headers are answered by
/// mirroring the request, since browsers refuse a literal `*` alongside
/// `Access-Control-Allow-Credentials: true`.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let credentials = config.allow_credentials;

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin(config))
        .allow_methods(allow_methods(&config.allowed_methods, credentials)?)
        .allow_headers(allow_headers(&config.allowed_headers, credentials)?)
        .allow_credentials(credentials);

    if !config.exposed_headers.is_empty() {
        layer = layer.expose_headers(expose_headers(&config.exposed_headers, credentials)?);
    }

    if config.max_age > 0 {
        layer = layer.max_age(Duration::from_secs(config.max_age));
    }

    Ok(layer)
}

fn allow_origin(config: &CorsConfig) -> AllowOrigin {
    if let Some(predicate) = config.allow_origin_fn.clone() {
        return AllowOrigin::predicate(move |origin: &HeaderValue, parts| {
            origin
                .to_str()
                .is_ok_and(|origin| predicate.check(parts, origin))
        });
    }

    let rules = OriginRules::new(config.allowed_origins.as_slice());
    if rules.allows_all() {
        return if config.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        };
    }

    AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin.to_str().is_ok_and(|origin| rules.matches(origin))
    })
}

fn allow_methods(methods: &[String], credentials: bool) -> Result<AllowMethods> {
    if methods.iter().any(|m| m.trim() == "*") {
        return Ok(if credentials {
            AllowMethods::mirror_request()
        } else {
            Any.into()
        });
    }

    let methods = if methods.is_empty() {
        vec![Method::GET, Method::POST, Method::HEAD]
    } else {
        methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| HttpError::config(format!("Invalid CORS method: {m}")))
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(AllowMethods::list(methods))
}

fn allow_headers(headers: &[String], credentials: bool) -> Result<AllowHeaders> {
    if headers.iter().any(|h| h.trim() == "*") {
        return Ok(if credentials {
            AllowHeaders::mirror_request()
        } else {
            Any.into()
        });
    }

    let mut names = parse_header_names(headers)?;
    if !names.contains(&header::ORIGIN) {
        names.push(header::ORIGIN);
    }

    Ok(AllowHeaders::list(names))
}

fn expose_headers(headers: &[String], credentials: bool) -> Result<ExposeHeaders> {
    if headers.iter().any(|h| h.trim() == "*") {
        if credentials {
            return Err(HttpError::config(
                "CORS exposed headers cannot be '*' when credentials are allowed",
            ));
        }
        return Ok(Any.into());
    }

    Ok(ExposeHeaders::list(parse_header_names(headers)?))
}

fn parse_header_names(headers: &[String]) -> Result<Vec<HeaderName>> {
    headers
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.trim().to_ascii_lowercase().as_bytes())
                .map_err(|_| HttpError::config(format!("Invalid CORS header: {h}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn star_or_empty_allows_everything() {
        assert!(OriginRules::new(&["*"]).matches("https://anything.test"));
        assert!(OriginRules::new::<&str>(&[]).matches("https://anything.test"));
    }

    #[test]
    fn exact_origins_are_case_insensitive() {
        let rules = OriginRules::new(&["https://App.Example.com"]);
        assert!(rules.matches("https://app.example.com"));
        assert!(rules.matches("HTTPS://APP.EXAMPLE.COM"));
        assert!(!rules.matches("https://evil.example.com"));
    }

    #[test]
    fn wildcard_needs_room_for_prefix_and_suffix() {
        let rules = OriginRules::new(&["https://*.example.com"]);
        assert!(rules.matches("https://api.example.com"));
        assert!(!rules.matches("https://example.com"));
        assert!(!rules.matches("http://api.example.com"));
    }

    #[test]
    fn invalid_method_is_a_config_error() {
        let config = CorsConfig {
            allowed_methods: vec![String::from("GET POST")],
            ..CorsConfig::default()
        };
        assert!(matches!(cors_layer(&config), Err(HttpError::Config(_))));
    }

    #[test]
    fn invalid_header_is_a_config_error() {
        let config = CorsConfig {
            allowed_headers: vec![String::from("bad header")],
            ..CorsConfig::default()
        };
        assert!(matches!(cors_layer(&config), Err(HttpError::Config(_))));
    }

    #[test]
    fn exposing_everything_with_credentials_is_rejected() {
        let config = CorsConfig {
            exposed_headers: vec![String::from("*")],
            allow_credentials: true,
            ..CorsConfig::default()
        };
        assert!(matches!(cors_layer(&config), Err(HttpError::Config(_))));
    }

    proptest! {
        #[test]
        fn wildcard_matches_any_subdomain(sub in "[a-z0-9]{1,16}") {
            let rules = OriginRules::new(&["https://*.example.com"]);
            let origin = format!("https://{sub}.example.com");
            prop_assert!(rules.matches(&origin));
        }

        #[test]
        fn wildcard_rejects_other_domains(sub in "[a-z0-9]{1,16}") {
            let rules = OriginRules::new(&["https://*.example.com"]);
            let origin = format!("https://{sub}.example.org");
            prop_assert!(!rules.matches(&origin));
        }
    }
}
