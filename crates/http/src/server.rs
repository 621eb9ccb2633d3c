//! Router wrapper with CORS wired from configuration.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::{MethodFilter, MethodRouter, Route, on};
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tower::{Layer, Service};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::{HttpConfig, HttpError, Result, cors, tls};

/// HTTP server: a router plus the listen configuration.
///
/// Routes and middleware are added builder-style; CORS and request tracing
/// are applied outermost when the server starts, so they cover every route
/// regardless of registration order.
pub struct HttpServer {
    config: HttpConfig,
    router: Router,
    cors: Option<CorsLayer>,
}

impl HttpServer {
    /// Create a server with an empty router and the CORS layer described by
    /// `config.cors`.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let cors = config.cors.as_ref().map(cors::cors_layer).transpose()?;

        Ok(Self {
            config,
            router: Router::new(),
            cors,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Add middleware to every route registered so far.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + 'static,
        L::Service: Service<Request> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.router = self.router.layer(layer);
        self
    }

    /// Register `handler` for `method` on `path`.
    pub fn method<H, T>(self, method: Method, path: &str, handler: H) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| HttpError::config(format!("Unsupported route method: {method}")))?;
        Ok(self.route(path, on(filter, handler)))
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Mount a sub-router under `path`. `/` merges it into the root.
    pub fn mount(mut self, path: &str, router: Router) -> Self {
        let prefix = path.trim_matches('/');
        self.router = if prefix.is_empty() {
            self.router.merge(router)
        } else {
            self.router.nest(&format!("/{prefix}"), router)
        };
        self
    }

    /// Finalize: apply tracing and CORS outermost.
    pub fn into_router(self) -> Router {
        let router = self.router.layer(TraceLayer::new_for_http());
        match self.cors {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    /// Serve plain HTTP on `config.address` until the process exits.
    pub async fn listen_and_serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve plain HTTP on `config.address` until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.address).await?;
        self.serve_listener(listener, signal).await
    }

    /// Serve plain HTTP on an already bound listener.
    pub async fn serve_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        serve_plain(listener, self.into_router(), signal).await
    }

    /// Serve HTTPS on `config.address_tls` until the process exits.
    pub async fn listen_and_serve_tls(self) -> Result<()> {
        self.serve_tls_with_shutdown(std::future::pending()).await
    }

    /// Serve HTTPS on `config.address_tls` until `signal` resolves.
    pub async fn serve_tls_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (address, acceptor) = tls_setup(&self.config)?;
        let listener = TcpListener::bind(&address).await?;
        serve_tls(listener, acceptor, self.into_router(), signal).await
    }

    /// Serve HTTPS on an already bound listener with the configured
    /// certificate and key.
    pub async fn serve_tls_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let acceptor = tls_acceptor(&self.config)?;
        serve_tls(listener, acceptor, self.into_router(), signal).await
    }

    /// Serve plain HTTP, and HTTPS when `config.address_tls` is set, until
    /// `signal` resolves. Returns the first listener error.
    pub async fn run<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tls = match self.config.address_tls {
            Some(_) => Some(tls_setup(&self.config)?),
            None => None,
        };
        let plain_listener = TcpListener::bind(&self.config.address).await?;
        let router = self.into_router();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            signal.await;
            let _ = shutdown_tx.send(true);
        });

        let plain = serve_plain(plain_listener, router.clone(), wait_for(shutdown_rx.clone()));

        match tls {
            Some((address, acceptor)) => {
                let tls_listener = TcpListener::bind(&address).await?;
                let secure = serve_tls(tls_listener, acceptor, router, wait_for(shutdown_rx));
                tokio::try_join!(plain, secure)?;
            }
            None => plain.await?,
        }

        Ok(())
    }
}

async fn wait_for(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

fn tls_setup(config: &HttpConfig) -> Result<(String, TlsAcceptor)> {
    let address = config
        .address_tls
        .clone()
        .ok_or_else(|| HttpError::config("TLS address is not configured"))?;
    Ok((address, tls_acceptor(config)?))
}

fn tls_acceptor(config: &HttpConfig) -> Result<TlsAcceptor> {
    let cert_file = config
        .cert_file
        .as_deref()
        .ok_or_else(|| HttpError::config("TLS certificate file is not configured"))?;
    let key_file = config
        .key_file
        .as_deref()
        .ok_or_else(|| HttpError::config("TLS key file is not configured"))?;

    let server_config = tls::load_server_config(cert_file, key_file)?;
    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

async fn serve_plain<F>(listener: TcpListener, router: Router, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await?;

    info!("http server stopped");
    Ok(())
}

/// Accept loop for TLS connections. On `signal` it stops accepting, asks
/// every open connection to finish its in-flight requests and waits for them.
async fn serve_tls<F>(listener: TcpListener, acceptor: TlsAcceptor, router: Router, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "https server listening");
    tokio::pin!(signal);

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut signal => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => continue,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            },
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        let stop = stop_rx.clone();

        connections.spawn(serve_tls_connection(stream, peer, acceptor, router, stop));
    }

    drop(listener);
    let _ = stop_tx.send(true);
    debug!(open = connections.len(), "draining https connections");
    while connections.join_next().await.is_some() {}

    info!("https server stopped");
    Ok(())
}

async fn serve_tls_connection(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    stop: watch::Receiver<bool>,
) {
    let stream = tokio::select! {
        accepted = acceptor.accept(stream) => match accepted {
            Ok(stream) => stream,
            Err(e) => {
                debug!(%peer, error = %e, "tls handshake failed");
                return;
            }
        },
        _ = wait_for(stop.clone()) => return,
    };

    let service = hyper::service::service_fn(move |request: axum::http::Request<Incoming>| {
        router.clone().call(request)
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = wait_for(stop) => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        debug!(%peer, error = %e, "connection closed with error");
    }
}
