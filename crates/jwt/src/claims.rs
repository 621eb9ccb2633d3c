use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Bearer token claims: the registered JWT claims plus the application
/// identity fields, serialized as a single flat JSON object.
///
/// Claims are produced by the caller; the token manager only signs and
/// verifies them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier.
    #[serde(default)]
    pub uid: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub email: String,

    /// BCP 47 locale tag (e.g. `en-US`).
    #[serde(default)]
    pub locale: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience. Accepts a single string or an array on input; always
    /// serialized as an array.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_seq"
    )]
    pub aud: Vec<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub exp: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub nbf: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub iat: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud.push(audience.into());
        self
    }

    pub fn with_token_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Set `iat` to the current time.
    pub fn issued_now(mut self) -> Self {
        self.iat = Some(now_seconds());
        self
    }

    /// Set `exp` relative to the current time.
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.exp = Some(truncate_seconds(now_seconds() + ttl));
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.exp = Some(truncate_seconds(at));
        self
    }

    pub fn not_before(mut self, at: DateTime<Utc>) -> Self {
        self.nbf = Some(truncate_seconds(at));
        self
    }

    /// Whether `exp` is set and lies at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }
}

/// Current time, whole seconds (JWT NumericDate precision).
pub fn now_seconds() -> DateTime<Utc> {
    truncate_seconds(Utc::now())
}

fn truncate_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(aud)) => vec![aud],
        Some(OneOrMany::Many(aud)) => aud,
    })
}
