use anyhow::{Context, Result};
use clap::Parser;
use fanout::{
    Protocols,
    serve::serve,
    telemetry::{init_tracing, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::info;

use chunked_streaming::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let tls = cli.tls.acceptor()?;
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    if tls.is_some() {
        info!("serving over TLS");
    }
    info!("streaming server listening on {}", listener.local_addr()?);

    serve(listener, chunked_streaming::app(), tls, Protocols::Auto, shutdown_signal())
        .await
        .context("server error")
}
