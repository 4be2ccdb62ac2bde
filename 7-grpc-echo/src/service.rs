//! `EchoService` and `HealthService` implementations.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info};

use crate::proto::{
    ClientStreamResponse, EchoRequest, EchoResponse, HealthCheckRequest, HealthCheckResponse,
    StreamRequest, StreamResponse, echo_service_server::EchoService,
    health_service_server::HealthService,
};

/// Replies buffered per streaming call before the sender waits on the client.
const STREAM_BUFFER: usize = 16;

pub const SERVING: &str = "SERVING";

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

#[tonic::async_trait]
impl EchoService for Echo {
    type ServerStreamStream = ReceiverStream<Result<StreamResponse, Status>>;
    type BidirectionalStreamStream = ReceiverStream<Result<StreamResponse, Status>>;

    async fn echo(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        let message = request.into_inner().message;
        info!(%message, "echo");
        Ok(Response::new(EchoResponse {
            message,
            timestamp: unix_now(),
        }))
    }

    async fn server_stream(
        &self,
        request: Request<StreamRequest>,
    ) -> Result<Response<Self::ServerStreamStream>, Status> {
        let StreamRequest { count, delay_ms } = request.into_inner();
        let delay = Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0));
        info!(count, delay_ms, "server stream");

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            for index in 0..count.max(0) {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let response = StreamResponse {
                    index,
                    message: format!("Message {} of {count}", index + 1),
                    timestamp: unix_now(),
                };
                if tx.send(Ok(response)).await.is_err() {
                    debug!(index, "server stream client went away");
                    return;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn client_stream(
        &self,
        request: Request<Streaming<EchoRequest>>,
    ) -> Result<Response<ClientStreamResponse>, Status> {
        let mut inbound = request.into_inner();
        let mut messages = Vec::new();
        while let Some(request) = inbound.next().await {
            let message = request?.message;
            debug!(%message, "client stream received");
            messages.push(message);
        }
        info!(count = messages.len(), "client stream completed");

        Ok(Response::new(ClientStreamResponse {
            count: i32::try_from(messages.len()).unwrap_or(i32::MAX),
            messages,
        }))
    }

    async fn bidirectional_stream(
        &self,
        request: Request<Streaming<EchoRequest>>,
    ) -> Result<Response<Self::BidirectionalStreamStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        info!("bidirectional stream started");

        tokio::spawn(async move {
            while let Some(request) = inbound.next().await {
                let reply = request.map(|request| StreamResponse {
                    index: 0,
                    message: format!("Echo: {}", request.message),
                    timestamp: unix_now(),
                });
                let failed = reply.is_err();
                if tx.send(reply).await.is_err() || failed {
                    break;
                }
            }
            info!("bidirectional stream completed");
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Health;

#[tonic::async_trait]
impl HealthService for Health {
    async fn check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse {
            status: SERVING.to_string(),
        }))
    }
}
