//! gRPC echo service with all four call shapes (unary, server streaming,
//! client streaming, bidirectional) plus a health service, and a small HTTP
//! side server whose `/health` asks the gRPC health service.

pub mod cli;
pub mod proto;
pub mod service;
pub mod web;

use std::future::Future;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use crate::{
    proto::{echo_service_server::EchoServiceServer, health_service_server::HealthServiceServer},
    service::{Echo, Health},
};

/// Serves both gRPC services on `listener` until `shutdown` resolves.
pub async fn serve_grpc<F>(listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    Server::builder()
        .add_service(EchoServiceServer::new(Echo))
        .add_service(HealthServiceServer::new(Health))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .context("grpc server error")
}
