use std::time::Duration;

use anyhow::{Context, ensure};
use groundwork_http::HttpConfig;
use groundwork_jwt::{KeyConfig, MAX_LEEWAY_SECS, SigningAlgorithm, TokenManager, ValidationConfig};
use groundwork_postgres::PostgresConfig;

/// Token settings for the service.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub algorithm: SigningAlgorithm,
    pub keys: KeyConfig,
    pub issuer: Option<String>,
    pub leeway_secs: u64,
    pub token_ttl: Duration,
}

impl JwtConfig {
    /// Build the token manager described by this config, loading key files.
    pub fn token_manager(&self) -> groundwork_jwt::TokenResult<TokenManager> {
        let mut validation = ValidationConfig::default().with_leeway(self.leeway_secs);
        if let Some(issuer) = &self.issuer {
            validation = validation.with_issuer(issuer.clone());
        }

        Ok(TokenManager::new(self.algorithm, &self.keys)?.with_validation(validation))
    }
}

/// Whole-process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    /// Present when `DATABASE_ENABLED` is truthy.
    pub postgres: Option<PostgresConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let algorithm = env("JWT_ALGORITHM")
            .unwrap_or_else(|| String::from("ES256"))
            .parse::<SigningAlgorithm>()
            .context("JWT_ALGORITHM")?;

        let leeway_secs = checked_leeway(parse_env("JWT_LEEWAY_SECS")?.unwrap_or(0))?;
        let token_ttl = Duration::from_secs(parse_env("JWT_TOKEN_TTL_SECS")?.unwrap_or(3600));

        let jwt = JwtConfig {
            algorithm,
            keys: KeyConfig::from_env("JWT"),
            issuer: env("JWT_ISSUER"),
            leeway_secs,
            token_ttl,
        };

        let postgres = env("DATABASE_ENABLED")
            .is_some_and(|v| truthy(&v))
            .then(PostgresConfig::from_env);

        Ok(Self {
            http: HttpConfig::from_env()?,
            jwt,
            postgres,
        })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env(key: &str) -> anyhow::Result<Option<u64>> {
    env(key)
        .map(|v| v.trim().parse::<u64>().with_context(|| format!("{key}={v}")))
        .transpose()
}

fn checked_leeway(secs: u64) -> anyhow::Result<u64> {
    ensure!(
        secs <= MAX_LEEWAY_SECS,
        "JWT_LEEWAY_SECS={secs} exceeds the maximum of {MAX_LEEWAY_SECS}"
    );
    Ok(secs)
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
