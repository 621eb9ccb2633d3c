use std::path::PathBuf;

use serde::Deserialize;

/// Where the key material lives.
///
/// Either path may be omitted: a verify-only manager needs just the public
/// key, a sign-only manager just the private key. For HMAC algorithms both
/// files hold the raw shared secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub public_key_file: Option<PathBuf>,
    pub private_key_file: Option<PathBuf>,
}

impl KeyConfig {
    pub fn new(public_key_file: impl Into<PathBuf>, private_key_file: impl Into<PathBuf>) -> Self {
        Self {
            public_key_file: Some(public_key_file.into()),
            private_key_file: Some(private_key_file.into()),
        }
    }

    /// Verification only.
    pub fn public_only(public_key_file: impl Into<PathBuf>) -> Self {
        Self {
            public_key_file: Some(public_key_file.into()),
            private_key_file: None,
        }
    }

    /// Signing only.
    pub fn private_only(private_key_file: impl Into<PathBuf>) -> Self {
        Self {
            public_key_file: None,
            private_key_file: Some(private_key_file.into()),
        }
    }

    /// Load from `{PREFIX}_PUBLIC_KEY_FILE` and `{PREFIX}_PRIVATE_KEY_FILE`.
    ///
    /// Unset or empty variables leave the corresponding half absent.
    pub fn from_env(prefix: &str) -> Self {
        Self {
            public_key_file: env_path(&format!("{prefix}_PUBLIC_KEY_FILE")),
            private_key_file: env_path(&format!("{prefix}_PRIVATE_KEY_FILE")),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Largest accepted clock-skew allowance, one day.
pub const MAX_LEEWAY_SECS: u64 = 86_400;

/// Registered-claim checks applied by `TokenManager::parse`.
///
/// `exp` and `nbf` are enforced whenever present in a token. The default
/// leeway is zero seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed clock skew in seconds, capped at [`MAX_LEEWAY_SECS`].
    pub leeway: u64,

    /// Required `iss`, if any.
    pub issuer: Option<String>,

    /// Accepted audiences; a token must name at least one. Empty disables
    /// the check.
    pub audience: Vec<String>,
}

impl ValidationConfig {
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds.min(MAX_LEEWAY_SECS);
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }
}
