//! rustls server configuration from PEM files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::{HttpError, Result};

/// Load a certificate chain and private key into a rustls server config
/// (ring provider, ALPN `h2` and `http/1.1`).
pub fn load_server_config(cert_file: &Path, key_file: &Path) -> Result<ServerConfig> {
    let certs = load_certs(cert_file)?;
    let key = load_private_key(key_file)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| HttpError::tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| HttpError::tls(format!("invalid certificate/key pair: {e}")))?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| HttpError::tls(format!("cannot open {path:?}: {e}")))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| HttpError::tls(format!("cannot parse certificates in {path:?}: {e}")))?;

    if certs.is_empty() {
        return Err(HttpError::tls(format!("no certificates found in {path:?}")));
    }

    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|e| HttpError::tls(format!("cannot parse private key in {path:?}: {e}")))?
        .ok_or_else(|| HttpError::tls(format!("no private key found in {path:?}")))
}
