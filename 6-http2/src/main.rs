use anyhow::{Context, Result};
use clap::Parser;
use fanout::{
    Protocols,
    serve::serve,
    telemetry::{init_tracing, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::info;

use http2_server::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let tls = cli.tls.acceptor()?;
    let protocols = if cli.h2c { Protocols::Auto } else { Protocols::Http1Only };
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    match (&tls, protocols) {
        (Some(_), _) => info!("serving over TLS, h2 offered via ALPN"),
        (None, Protocols::Auto) => info!("h2c enabled, HTTP/2 needs prior knowledge"),
        (None, Protocols::Http1Only) => info!("h2c disabled, serving HTTP/1.1 only"),
    }
    info!("http2 server listening on {}", listener.local_addr()?);

    serve(listener, http2_server::app(), tls, protocols, shutdown_signal())
        .await
        .context("server error")
}
