use std::{net::SocketAddr, time::Duration};

use anyhow::Result;
use grpc_echo::{
    proto::{
        EchoRequest, HealthCheckRequest, StreamRequest,
        echo_service_client::EchoServiceClient, health_service_client::HealthServiceClient,
    },
    serve_grpc,
};
use reqwest::StatusCode;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::timeout,
};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tonic::transport::Channel;

const READ_TIMEOUT: Duration = Duration::from_secs(3);

struct Server {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<()>>,
}

impl Server {
    async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_grpc(listener, async move {
            let _ = shutdown_rx.await;
        }));
        Ok(Self {
            addr,
            shutdown,
            server,
        })
    }

    async fn client(&self) -> Result<EchoServiceClient<Channel>> {
        Ok(EchoServiceClient::connect(format!("http://{}", self.addr)).await?)
    }

    async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        timeout(READ_TIMEOUT, self.server).await???;
        Ok(())
    }
}

fn echo_request(message: &str) -> EchoRequest {
    EchoRequest {
        message: message.to_string(),
    }
}

#[tokio::test]
async fn unary_echo_returns_the_message() -> Result<()> {
    let server = Server::start().await?;
    let mut client = server.client().await?;

    let reply = client.echo(echo_request("hello")).await?.into_inner();
    assert_eq!(reply.message, "hello");
    assert!(reply.timestamp > 0);

    drop(client);
    server.stop().await
}

#[tokio::test]
async fn server_stream_sends_count_messages_in_order() -> Result<()> {
    let server = Server::start().await?;
    let mut client = server.client().await?;

    let request = StreamRequest {
        count: 4,
        delay_ms: 10,
    };
    let mut stream = client.server_stream(request).await?.into_inner();
    let mut replies = Vec::new();
    while let Some(reply) = timeout(READ_TIMEOUT, stream.message()).await?? {
        replies.push(reply);
    }

    let indexes: Vec<_> = replies.iter().map(|reply| reply.index).collect();
    assert_eq!(indexes, [0, 1, 2, 3]);
    assert_eq!(replies[0].message, "Message 1 of 4");
    assert_eq!(replies[3].message, "Message 4 of 4");

    drop(client);
    server.stop().await
}

#[tokio::test]
async fn client_stream_collects_every_message() -> Result<()> {
    let server = Server::start().await?;
    let mut client = server.client().await?;

    let outbound = tokio_stream::iter(["one", "two", "three"].map(echo_request));
    let reply = client.client_stream(outbound).await?.into_inner();
    assert_eq!(reply.count, 3);
    assert_eq!(reply.messages, ["one", "two", "three"]);

    drop(client);
    server.stop().await
}

#[tokio::test]
async fn bidirectional_stream_answers_each_message() -> Result<()> {
    let server = Server::start().await?;
    let mut client = server.client().await?;

    let (tx, rx) = mpsc::channel(4);
    let mut replies = client
        .bidirectional_stream(ReceiverStream::new(rx))
        .await?
        .into_inner();

    for message in ["ping", "pong"] {
        tx.send(echo_request(message)).await?;
        let reply = timeout(READ_TIMEOUT, replies.next()).await?;
        let reply = reply.ok_or_else(|| anyhow::anyhow!("stream ended early"))??;
        assert_eq!(reply.message, format!("Echo: {message}"));
        assert_eq!(reply.index, 0);
    }

    drop(tx);
    assert!(timeout(READ_TIMEOUT, replies.message()).await??.is_none());

    drop(client);
    server.stop().await
}

#[tokio::test]
async fn health_service_is_serving() -> Result<()> {
    let server = Server::start().await?;
    let mut health = HealthServiceClient::connect(format!("http://{}", server.addr)).await?;

    let reply = health.check(HealthCheckRequest {}).await?.into_inner();
    assert_eq!(reply.status, "SERVING");

    drop(health);
    server.stop().await
}

async fn spawn_web(grpc_addr: SocketAddr) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, grpc_echo::web::app(grpc_addr)).await;
    });
    Ok(addr)
}

#[tokio::test]
async fn http_health_asks_the_grpc_server() -> Result<()> {
    let server = Server::start().await?;
    let web = spawn_web(server.addr).await?;

    let response = reqwest::get(format!("http://{web}/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "SERVING");

    server.stop().await
}

#[tokio::test]
async fn http_health_fails_without_grpc_server() -> Result<()> {
    let vacant = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    let web = spawn_web(vacant).await?;

    let response = reqwest::get(format!("http://{web}/health")).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
