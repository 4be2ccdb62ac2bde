use tracing_subscriber::{EnvFilter, fmt};

/// Installs the fmt subscriber used by every demo binary. `RUST_LOG`
/// overrides the default `info` filter. Calling it again keeps the first
/// subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = fmt().with_env_filter(filter).with_target(false).try_init() {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

/// Resolves once ctrl-c is received. Servers pass it to graceful shutdown.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = ?err, "failed to install ctrl-c handler");
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        init_tracing();
        init_tracing();
        tracing::info!("still logging");
    }
}
