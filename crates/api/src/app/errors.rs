use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use groundwork_jwt::TokenError;

/// Map a token error raised while minting to a response.
///
/// Verification failures never reach here; the auth middleware answers
/// those with 401.
pub fn token_error_to_response(err: TokenError) -> axum::response::Response {
    match err {
        TokenError::MissingKey(_) | TokenError::Signing(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.kind(),
            err.to_string(),
        ),
        other => json_error(StatusCode::BAD_REQUEST, other.kind(), other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
