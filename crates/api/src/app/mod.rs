//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use chrono::Duration;
use sqlx::PgPool;

use groundwork_jwt::TokenManager;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenManager>,
    /// Lifetime of tokens minted by `POST /token`.
    pub token_ttl: Duration,
    pub issuer: Option<String>,
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(tokens: Arc<TokenManager>) -> Self {
        Self {
            tokens,
            token_ttl: Duration::hours(1),
            issuer: None,
            db: None,
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_db(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}

/// Build the full HTTP router with default state.
pub fn build_app(tokens: Arc<TokenManager>) -> Router {
    build_app_with_state(AppState::new(tokens))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `/token` is only routed when the manager holds a private key.
pub fn build_app_with_state(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        tokens: state.tokens.clone(),
    };

    // Protected routes: require a verified bearer token. `route_layer` keeps
    // the fallback outside auth so unknown paths stay 404.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let mut public = Router::new().route("/health", get(routes::system::health));
    if state.tokens.can_sign() {
        public = public.route("/token", post(routes::tokens::issue));
    }

    public.merge(protected).layer(Extension(state))
}
