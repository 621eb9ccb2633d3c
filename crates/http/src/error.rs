//! Error types for the HTTP server wrapper.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid configuration (CORS rules, missing TLS paths, route filters).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bind/accept/serve I/O failures.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Certificate or key loading, or rustls setup.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl HttpError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
