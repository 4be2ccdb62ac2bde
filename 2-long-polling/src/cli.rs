use std::net::SocketAddr;

use clap::{ArgAction, Parser};
use fanout::BrokerArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Long-polling demo server", long_about = None)]
pub struct Cli {
    /// Socket address to bind. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Publish a canned notification periodically.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub autogen: bool,

    /// Seconds between auto-generated notifications.
    #[arg(long, default_value_t = 15)]
    pub autogen_interval_secs: u64,

    #[command(flatten)]
    pub broker: BrokerArgs,
}
