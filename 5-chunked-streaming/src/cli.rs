use std::net::SocketAddr;

use clap::Parser;
use fanout::TlsArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chunked and streaming response demo server", long_about = None)]
pub struct Cli {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8083")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub tls: TlsArgs,
}
