//! `groundwork-postgres`: Postgres connection pool bootstrap.
//!
//! Builds a `sqlx` [`PgPool`](sqlx::PgPool) from [`PostgresConfig`], checks the
//! server's `uuid` type on every new connection and pings before handing the
//! pool back.

pub mod config;
pub mod error;
pub mod pool;

pub use config::PostgresConfig;
pub use error::DbError;
pub use pool::{UUID_OID, connect, register_uuid_type};
