use std::sync::Arc;

use tokio::signal;
use tracing::info;

use groundwork_api::app::{AppState, build_app_with_state};
use groundwork_api::config::AppConfig;
use groundwork_http::HttpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    groundwork_observability::init();

    let config = AppConfig::from_env()?;
    info!(
        algorithm = %config.jwt.algorithm,
        address = %config.http.address,
        tls = config.http.address_tls.is_some(),
        "starting groundwork api"
    );

    let tokens = Arc::new(config.jwt.token_manager()?);
    if !tokens.can_verify() {
        tracing::warn!("JWT_PUBLIC_KEY_FILE not set; protected routes will reject every request");
    }

    let mut state = AppState::new(tokens)
        .with_token_ttl(chrono::Duration::from_std(config.jwt.token_ttl)?)
        .with_issuer(config.jwt.issuer.clone());

    let pool = match &config.postgres {
        Some(pg) => Some(groundwork_postgres::connect(pg).await?),
        None => None,
    };
    if let Some(pool) = &pool {
        state = state.with_db(pool.clone());
    }

    HttpServer::new(config.http)?
        .mount("/", build_app_with_state(state))
        .run(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
