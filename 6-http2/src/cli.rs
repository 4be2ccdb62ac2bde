use std::net::SocketAddr;

use clap::{ArgAction, Parser};
use fanout::TlsArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP/2 protocol demo server", long_about = None)]
pub struct Cli {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8084")]
    pub listen: SocketAddr,

    /// Accept cleartext HTTP/2 with prior knowledge. `--h2c false` pins
    /// cleartext listeners to HTTP/1.1; TLS listeners always offer h2.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub h2c: bool,

    #[command(flatten)]
    pub tls: TlsArgs,
}
