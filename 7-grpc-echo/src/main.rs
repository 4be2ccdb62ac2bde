use anyhow::{Context, Result};
use clap::Parser;
use fanout::telemetry::{init_tracing, shutdown_signal};
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use grpc_echo::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let grpc_listener = TcpListener::bind(cli.grpc_listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.grpc_listen))?;
    let http_listener = TcpListener::bind(cli.http_listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.http_listen))?;
    let grpc_addr = grpc_listener.local_addr()?;
    info!("grpc server listening on {grpc_addr}");
    info!("http info server listening on {}", http_listener.local_addr()?);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });
    let stopped = |mut stop_rx: watch::Receiver<bool>| async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    };

    let grpc = grpc_echo::serve_grpc(grpc_listener, stopped(stop_rx.clone()));
    let http = async {
        axum::serve(http_listener, grpc_echo::web::app(grpc_addr))
            .with_graceful_shutdown(stopped(stop_rx))
            .await
            .context("http server error")
    };
    let (grpc, http) = tokio::join!(grpc, http);
    grpc?;
    http
}
