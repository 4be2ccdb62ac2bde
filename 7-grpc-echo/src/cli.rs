use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "gRPC echo server with an HTTP info page", long_about = None)]
pub struct Cli {
    /// Socket address for the gRPC services.
    #[arg(long, default_value = "127.0.0.1:50051")]
    pub grpc_listen: SocketAddr,

    /// Socket address for the HTTP page and `/health`.
    #[arg(long, default_value = "127.0.0.1:8085")]
    pub http_listen: SocketAddr,
}
