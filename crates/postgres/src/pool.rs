//! Pool construction.

use std::str::FromStr;

use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};
use sqlx::{Connection, PgPool};
use tracing::{error, info};

use crate::{DbError, PostgresConfig};

/// Type OID the server must report for `uuid`; sqlx binds `uuid::Uuid` with it.
pub const UUID_OID: u32 = 2950;

/// Open a connection pool and ping the server once.
///
/// Every connection the pool opens runs [`register_uuid_type`] before it is
/// handed out.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, DbError> {
    info!(host = %config.host, database = %config.dbname, "connecting to postgres");

    let options = PgConnectOptions::from_str(&config.connection_url()).map_err(|e| {
        error!(error = %e, url = %config.redacted_url(), "invalid postgres configuration");
        DbError::Config(e)
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .after_connect(|conn, _meta| Box::pin(register_uuid_type(conn)))
        .connect_with(options)
        .await
        .map_err(|e| {
            error!(error = %e, host = %config.host, "failed to connect to postgres");
            DbError::Connect(e)
        })?;

    ping(&pool).await.map_err(|e| {
        error!(error = %e, host = %config.host, "postgres ping failed");
        DbError::Ping(e)
    })?;

    info!(host = %config.host, database = %config.dbname, "connected to postgres");
    Ok(pool)
}

/// Confirm the server resolves `uuid` to [`UUID_OID`].
///
/// sqlx encodes and decodes `uuid::Uuid` against that OID, so a server that
/// reports anything else cannot round-trip UUID columns.
pub async fn register_uuid_type(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    let oid: Oid = sqlx::query_scalar("SELECT 'uuid'::regtype::oid")
        .fetch_one(&mut *conn)
        .await?;

    if oid.0 != UUID_OID {
        return Err(sqlx::Error::Protocol(format!(
            "server reports uuid type oid {}, expected {UUID_OID}",
            oid.0
        )));
    }

    Ok(())
}

async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}
