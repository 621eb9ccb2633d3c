//! `groundwork-http`: HTTP server bootstrap.
//!
//! Wraps an axum [`Router`](axum::Router) with a CORS policy built from
//! [`HttpConfig`], and serves it over plain TCP or TLS (rustls).

pub mod config;
pub mod cors;
pub mod error;
pub mod server;
pub mod tls;

pub use config::{CorsConfig, HttpConfig, OriginPredicate};
pub use cors::{OriginRules, cors_layer};
pub use error::{HttpError, Result};
pub use server::HttpServer;
