use thiserror::Error;

/// Failure while bringing up the connection pool.
///
/// Each variant corresponds to one stage of [`connect`](crate::connect):
///
/// | Stage | Variant |
/// |-------|---------|
/// | DSN parsed into `PgConnectOptions` | `Config` |
/// | pool opened (includes the `after_connect` uuid check) | `Connect` |
/// | first ping | `Ping` |
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid postgres configuration: {0}")]
    Config(#[source] sqlx::Error),

    #[error("failed to connect to postgres: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("postgres ping failed: {0}")]
    Ping(#[source] sqlx::Error),
}
