use axum::{Router, routing::get};

pub mod system;
pub mod tokens;

/// Routes that sit behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new().route("/whoami", get(system::whoami))
}
