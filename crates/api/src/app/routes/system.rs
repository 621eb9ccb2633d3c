use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app::AppState;
use crate::app::dto::WhoAmIResponse;
use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Liveness, plus a round trip to Postgres when a pool is configured.
pub async fn health(Extension(state): Extension<AppState>) -> Response {
    if let Some(db) = &state.db {
        if let Err(e) = sqlx::query("SELECT 1").execute(db).await {
            warn!(error = %e, "database health check failed");
            return json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "database_unavailable",
                e.to_string(),
            );
        }
    }

    StatusCode::OK.into_response()
}

pub async fn whoami(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    Json(WhoAmIResponse {
        uid: principal.uid(),
        algorithm: state.tokens.algorithm().name(),
        claims: principal.claims(),
    })
    .into_response()
}
