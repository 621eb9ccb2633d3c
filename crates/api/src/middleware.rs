use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use groundwork_jwt::TokenManager;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenManager>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| unauthorized("missing_token", "bearer token required"))?;

    let verified = state.tokens.parse(token).map_err(|e| {
        debug!(error = %e, kind = e.kind(), "rejected bearer token");
        unauthorized(e.kind(), e.to_string())
    })?;

    req.extensions_mut()
        .insert(PrincipalContext::new(verified.into_claims()));

    Ok(next.run(req).await)
}

fn unauthorized(code: &'static str, message: impl Into<String>) -> Response {
    let mut res = json_error(StatusCode::UNAUTHORIZED, code, message);
    res.headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token)
}
