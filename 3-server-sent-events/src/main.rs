use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fanout::{
    Broker, BrokerConfig, Protocols,
    serve::serve,
    telemetry::{init_tracing, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::info;

use server_sent_events::{cli::Cli, ticker};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let tls = cli.tls.acceptor()?;
    let broker = Broker::new(BrokerConfig::from(&cli.broker));

    let tick_task = (cli.tick > 0).then(|| {
        info!(every_secs = cli.tick, "auto-broadcasting ticks");
        ticker::spawn(broker.clone(), Duration::from_secs(cli.tick))
    });

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    if tls.is_some() {
        info!("serving over TLS");
    }
    info!("SSE server listening on {}", listener.local_addr()?);

    let app = server_sent_events::app(broker);
    serve(listener, app, tls, Protocols::Auto, shutdown_signal())
        .await
        .context("server error")?;

    if let Some(tick_task) = tick_task {
        tick_task.abort();
    }

    Ok(())
}
