//! Accept loop shared by the HTTP demo servers.
//!
//! `axum::serve` only speaks cleartext. This loop can also terminate TLS
//! (advertising `h2` and `http/1.1` over ALPN), pin a cleartext listener to
//! HTTP/1.1, and hands every request its peer address as [`ConnectInfo`] and,
//! on TLS connections, a [`TlsInfo`] extension.

use std::{
    error::Error as StdError,
    future::Future,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{Router, extract::ConnectInfo, http::Request};
use clap::Args;
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{
        conn::auto::Builder,
        graceful::{GracefulShutdown, Watcher},
    },
};
use rustls::{
    ServerConfig, ServerConnection,
    pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};
use tower::Service;
use tracing::{debug, info, warn};

pub use tokio_rustls::TlsAcceptor;

/// `--cert`/`--key` flags. Serving switches to TLS when both are given.
#[derive(Args, Debug, Clone, Default)]
pub struct TlsArgs {
    /// PEM certificate chain.
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,

    /// PEM private key matching --cert.
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,
}

impl TlsArgs {
    pub fn acceptor(&self) -> Result<Option<TlsAcceptor>> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => tls_acceptor(cert, key).map(Some),
            _ => Ok(None),
        }
    }
}

/// Negotiated session parameters, attached to requests that arrived over TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    pub version: String,
    pub cipher: String,
}

impl From<&ServerConnection> for TlsInfo {
    fn from(session: &ServerConnection) -> Self {
        let version = session.protocol_version().map(|version| format!("{version:?}"));
        let cipher = session
            .negotiated_cipher_suite()
            .map(|suite| format!("{:?}", suite.suite()));
        Self {
            version: version.unwrap_or_else(|| "unknown".to_string()),
            cipher: cipher.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Which HTTP versions a cleartext listener accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocols {
    /// HTTP/1.1, plus HTTP/2 with prior knowledge (h2c).
    #[default]
    Auto,
    Http1Only,
}

pub fn tls_acceptor(cert: &Path, key: &Path) -> Result<TlsAcceptor> {
    let chain = CertificateDer::pem_file_iter(cert)
        .with_context(|| format!("failed to read certificate {}", cert.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid certificate in {}", cert.display()))?;
    let key = PrivateKeyDer::from_pem_file(key)
        .with_context(|| format!("failed to read private key {}", key.display()))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .context("certificate and private key do not match")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Serves `app` on `listener` until `shutdown` resolves, then waits for open
/// connections to finish. Upgraded connections (websockets) are not waited on.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    tls: Option<TlsAcceptor>,
    protocols: Protocols,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let mut builder = Builder::new(TokioExecutor::new());
    if protocols == Protocols::Http1Only && tls.is_none() {
        builder = builder.http1_only();
    }
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let app = app.clone();
        let builder = builder.clone();
        let tls = tls.clone();
        let watcher = graceful.watcher();
        tokio::spawn(async move {
            let result = match tls {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(stream) => {
                        let info = TlsInfo::from(stream.get_ref().1);
                        serve_connection(&builder, stream, app, peer, Some(info), watcher).await
                    }
                    Err(err) => {
                        debug!(%peer, error = %err, "tls handshake failed");
                        return;
                    }
                },
                None => serve_connection(&builder, stream, app, peer, None, watcher).await,
            };

            if let Err(err) = result {
                debug!(%peer, error = %err, "connection ended with error");
            }
        });
    }

    drop(listener);
    info!(open = graceful.count(), "draining connections");
    graceful.shutdown().await;
    Ok(())
}

async fn serve_connection<I>(
    builder: &Builder<TokioExecutor>,
    io: I,
    app: Router,
    peer: SocketAddr,
    tls: Option<TlsInfo>,
    watcher: Watcher,
) -> Result<(), Box<dyn StdError + Send + Sync>>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        if let Some(tls) = &tls {
            request.extensions_mut().insert(tls.clone());
        }
        app.clone().call(request)
    });

    watcher
        .watch(builder.serve_connection_with_upgrades(TokioIo::new(io), service))
        .await
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        tls: TlsArgs,
    }

    #[test]
    fn no_flags_means_cleartext() {
        let harness = Harness::parse_from(["test"]);
        assert!(harness.tls.acceptor().expect("no tls").is_none());
    }

    #[test]
    fn cert_requires_key() {
        assert!(Harness::try_parse_from(["test", "--cert", "cert.pem"]).is_err());
        assert!(Harness::try_parse_from(["test", "--key", "key.pem"]).is_err());
    }

    #[test]
    fn missing_files_are_reported() {
        let harness = Harness::parse_from([
            "test",
            "--cert",
            "/nonexistent/cert.pem",
            "--key",
            "/nonexistent/key.pem",
        ]);
        let Err(err) = harness.tls.acceptor() else {
            panic!("files do not exist");
        };
        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }
}
