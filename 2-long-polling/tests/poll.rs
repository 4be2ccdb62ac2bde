use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use anyhow::Result;
use fanout::{Broker, BrokerConfig, Message};
use long_polling::MessageBatch;
use serde_json::json;
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};

async fn spawn_server(broker: Broker) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, long_polling::app(broker)).await;
    });
    Ok((addr, server))
}

async fn send(client: &reqwest::Client, addr: SocketAddr, text: &str) -> Result<Message> {
    let message = client
        .post(format!("http://{addr}/send"))
        .json(&json!({ "text": text }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(message)
}

async fn poll(client: &reqwest::Client, addr: SocketAddr, query: &str) -> Result<MessageBatch> {
    let batch = client
        .get(format!("http://{addr}/poll?{query}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(batch)
}

#[tokio::test]
async fn poll_returns_resident_messages_immediately() -> Result<()> {
    let (addr, server) = spawn_server(Broker::default()).await?;
    let client = reqwest::Client::new();

    let first = send(&client, addr, "A").await?;
    let second = send(&client, addr, "B").await?;
    assert_eq!((first.id, second.id), (1, 2));

    let started = Instant::now();
    let batch = poll(&client, addr, "since=0&timeout=30").await?;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(batch.count, 2);
    assert_eq!(batch.messages, vec![first, second.clone()]);

    let batch = poll(&client, addr, "since=1").await?;
    assert_eq!(batch.messages, vec![second]);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn poll_times_out_with_empty_batch() -> Result<()> {
    let (addr, server) = spawn_server(Broker::default()).await?;
    let client = reqwest::Client::new();
    send(&client, addr, "only").await?;

    let started = Instant::now();
    let batch = poll(&client, addr, "since=1&timeout=1").await?;

    assert_eq!(batch.count, 0);
    assert!(batch.messages.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(900));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn pending_poll_is_answered_by_send() -> Result<()> {
    let (addr, server) = spawn_server(Broker::default()).await?;
    let client = reqwest::Client::new();

    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { poll(&client, addr, "since=0&timeout=30").await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    send(&client, addr, "wake up").await?;

    let batch = timeout(Duration::from_secs(5), waiting).await???;
    assert_eq!(batch.count, 1);
    assert_eq!(batch.messages[0].text, "wake up");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn messages_reflect_bounded_history() -> Result<()> {
    let broker = Broker::new(BrokerConfig {
        history_capacity: 3,
        ..BrokerConfig::default()
    });
    let (addr, server) = spawn_server(broker).await?;
    let client = reqwest::Client::new();

    for n in 1..=5 {
        send(&client, addr, &format!("message {n}")).await?;
    }

    let batch: MessageBatch = client
        .get(format!("http://{addr}/messages"))
        .send()
        .await?
        .json()
        .await?;
    let ids: Vec<_> = batch.messages.iter().map(|message| message.id).collect();
    assert_eq!(batch.count, 3);
    assert_eq!(ids, vec![3, 4, 5]);

    let health: serde_json::Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["last_id"], 5);

    server.abort();
    Ok(())
}
