use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::app::AppState;
use crate::app::dto::{IssueTokenRequest, IssueTokenResponse};
use crate::app::errors::{json_error, token_error_to_response};

/// Mint a bearer token for the posted identity.
pub async fn issue(
    Extension(state): Extension<AppState>,
    Json(body): Json<IssueTokenRequest>,
) -> Response {
    if body.uid.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "uid is required");
    }

    let mut claims = body.into_claims().issued_now().expires_in(state.token_ttl);
    if let Some(issuer) = &state.issuer {
        claims = claims.with_issuer(issuer.clone());
    }

    match state.tokens.signed_token(&claims) {
        Ok(access_token) => {
            info!(uid = %claims.uid, "issued token");
            Json(IssueTokenResponse {
                access_token,
                token_type: String::from("Bearer"),
                expires_at: claims.exp.map(|exp| exp.timestamp()),
            })
            .into_response()
        }
        Err(e) => token_error_to_response(e),
    }
}
