use serde::{Deserialize, Serialize};

use groundwork_jwt::Claims;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueTokenRequest {
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub audience: Vec<String>,
}

impl IssueTokenRequest {
    pub fn into_claims(self) -> Claims {
        let claims = Claims::new(self.uid)
            .with_display_name(self.display_name)
            .with_email(self.email)
            .with_locale(self.locale);

        self.audience
            .into_iter()
            .fold(claims, |claims, aud| claims.with_audience(aud))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Unix seconds.
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhoAmIResponse<'a> {
    pub uid: &'a str,
    pub algorithm: &'static str,
    pub claims: &'a Claims,
}
