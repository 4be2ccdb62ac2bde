use std::net::SocketAddr;

use clap::Parser;
use fanout::{BrokerArgs, TlsArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Server-Sent Events demo server", long_about = None)]
pub struct Cli {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8081")]
    pub listen: SocketAddr,

    /// Broadcast a tick to every connected client every N seconds (0 disables).
    #[arg(long, default_value_t = 0)]
    pub tick: u64,

    #[command(flatten)]
    pub broker: BrokerArgs,

    #[command(flatten)]
    pub tls: TlsArgs,
}
