use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fanout::{
    Broker, BrokerConfig,
    telemetry::{init_tracing, shutdown_signal},
};
use tokio::net::TcpListener;
use tracing::info;

use long_polling::{autogen, cli::Cli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let broker = Broker::new(BrokerConfig::from(&cli.broker));

    let generator = cli.autogen.then(|| {
        info!(every_secs = cli.autogen_interval_secs, "auto-generating messages");
        autogen::spawn(
            broker.clone(),
            Duration::from_secs(cli.autogen_interval_secs),
        )
    });

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    let addr = listener.local_addr()?;
    info!("long-polling server listening on {}", addr);

    axum::serve(listener, long_polling::app(broker))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(generator) = generator {
        generator.abort();
    }

    Ok(())
}
