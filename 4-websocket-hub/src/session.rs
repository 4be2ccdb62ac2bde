use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use fanout::{Broker, Payload, Subscription};
use tokio::select;
use tracing::{debug, info, warn};

/// Inbound text that asks the hub to broadcast instead of echoing.
pub const BROADCAST_TOKEN: &str = "broadcast";

/// Drives one upgraded connection until either direction fails or the peer
/// closes, then unregisters its subscriber.
pub async fn run(mut socket: WebSocket, broker: Broker, peer: SocketAddr) {
    let mut subscription = broker.register();
    info!(%peer, subscriber = %subscription.id(), "websocket connected");

    match run_session(&mut socket, &broker, &mut subscription, peer).await {
        Ok(()) => info!(%peer, "websocket disconnected"),
        Err(err) => warn!(%peer, error = ?err, "websocket closed with error"),
    }

    subscription.unregister();
}

async fn run_session(
    socket: &mut WebSocket,
    broker: &Broker,
    subscription: &mut Subscription,
    peer: SocketAddr,
) -> Result<()> {
    loop {
        select! {
            inbound = socket.recv() => {
                if !handle_inbound(inbound, socket, broker, peer).await? {
                    break;
                }
            }
            delivery = subscription.recv() => {
                if !handle_delivery(delivery, socket).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn handle_inbound(
    inbound: Option<Result<Message, axum::Error>>,
    socket: &mut WebSocket,
    broker: &Broker,
    peer: SocketAddr,
) -> Result<bool> {
    let message = match inbound {
        Some(message) => message?,
        None => return Ok(false),
    };

    match message {
        Message::Text(text) => {
            debug!(%peer, %text, "received");
            if text == BROADCAST_TOKEN {
                let report = broker.broadcast(format!("Broadcast from server at {peer}"));
                info!(%peer, delivered = report.delivered, "broadcast requested");
            } else {
                socket.send(Message::Text(format!("Echo: {text}"))).await?;
            }
            Ok(true)
        }
        Message::Close(_) => Ok(false),
        // Pings are answered by the protocol layer; binary frames are ignored.
        _ => Ok(true),
    }
}

async fn handle_delivery(delivery: Option<Payload>, socket: &mut WebSocket) -> Result<bool> {
    match delivery {
        Some(payload) => {
            socket.send(Message::Text(payload.to_string())).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
