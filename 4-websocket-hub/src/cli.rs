use std::net::SocketAddr;

use clap::Parser;
use fanout::{BrokerArgs, TlsArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "WebSocket echo and broadcast hub", long_about = None)]
pub struct Cli {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8082")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub broker: BrokerArgs,

    #[command(flatten)]
    pub tls: TlsArgs,
}
