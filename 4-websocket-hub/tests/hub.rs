use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result, anyhow};
use fanout::Broker;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const READ_TIMEOUT: Duration = Duration::from_secs(3);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Hub {
    addr: SocketAddr,
    broker: Broker,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl Hub {
    async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let broker = Broker::default();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let server = {
            let broker = broker.clone();
            tokio::spawn(async move {
                let shutdown = async move {
                    let _ = shutdown_rx.await;
                };
                let _ = websocket_hub::serve(listener, broker, None, shutdown).await;
            })
        };

        Ok(Self {
            addr,
            broker,
            shutdown,
            server,
        })
    }

    async fn connect(&self) -> Result<Client> {
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr)).await?;
        Ok(client)
    }

    async fn wait_for_subscribers(&self, expected: usize) -> Result<()> {
        let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
        while self.broker.subscriber_count() != expected {
            if tokio::time::Instant::now() > deadline {
                return Err(anyhow!(
                    "expected {expected} subscribers, have {}",
                    self.broker.subscriber_count()
                ));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }

    async fn stop(self) {
        // Open websocket sessions keep graceful shutdown waiting, so abort.
        let _ = self.shutdown.send(());
        self.server.abort();
        let _ = self.server.await;
    }
}

async fn next_text(client: &mut Client) -> Result<String> {
    loop {
        let message = timeout(READ_TIMEOUT, client.next())
            .await
            .map_err(|_| anyhow!("timed out waiting for a frame"))?
            .context("connection closed")??;
        if message.is_text() {
            return Ok(message.to_text()?.to_string());
        }
    }
}

#[tokio::test]
async fn text_is_echoed_back() -> Result<()> {
    let hub = Hub::start().await?;
    let mut alice = hub.connect().await?;

    alice.send(Message::text("hello")).await?;

    assert_eq!(next_text(&mut alice).await?, "Echo: hello");
    assert!(hub.broker.messages().is_empty());

    hub.stop().await;
    Ok(())
}

#[tokio::test]
async fn broadcast_token_reaches_every_client() -> Result<()> {
    let hub = Hub::start().await?;
    let mut alice = hub.connect().await?;
    let mut bob = hub.connect().await?;
    hub.wait_for_subscribers(2).await?;

    alice.send(Message::text("broadcast")).await?;

    let to_alice = next_text(&mut alice).await?;
    let to_bob = next_text(&mut bob).await?;
    assert!(to_alice.starts_with("Broadcast from server at 127.0.0.1:"), "got {to_alice}");
    assert_eq!(to_alice, to_bob);

    hub.stop().await;
    Ok(())
}

#[tokio::test]
async fn published_messages_are_pushed_to_clients() -> Result<()> {
    let hub = Hub::start().await?;
    let mut client = hub.connect().await?;
    hub.wait_for_subscribers(1).await?;

    hub.broker.publish("from the broker");

    assert_eq!(next_text(&mut client).await?, "from the broker");

    hub.stop().await;
    Ok(())
}

#[tokio::test]
async fn closing_connection_unregisters() -> Result<()> {
    let hub = Hub::start().await?;
    let mut alice = hub.connect().await?;
    let bob = hub.connect().await?;
    hub.wait_for_subscribers(2).await?;

    alice.close(None).await?;
    hub.wait_for_subscribers(1).await?;

    drop(bob);
    hub.wait_for_subscribers(0).await?;

    hub.stop().await;
    Ok(())
}
