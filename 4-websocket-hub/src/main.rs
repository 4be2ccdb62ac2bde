use anyhow::{Context, Result};
use clap::Parser;
use fanout::{
    Broker, BrokerConfig,
    telemetry::{init_tracing, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::info;

use websocket_hub::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let tls = cli.tls.acceptor()?;
    let broker = Broker::new(BrokerConfig::from(&cli.broker));

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    if tls.is_some() {
        info!("serving over TLS");
    }
    info!("websocket hub listening on {}", listener.local_addr()?);

    websocket_hub::serve(listener, broker, tls, shutdown_signal())
        .await
        .context("server error")
}
