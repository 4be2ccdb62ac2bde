//! WebSocket transport over the fan-out broker.
//!
//! Each connection is a duplex session: inbound text is echoed back, except
//! for the `broadcast` control token which fans a server message out to every
//! connected client. Anything the broker delivers to the connection's
//! subscriber queue is written outbound as a text frame.

pub mod cli;
pub mod session;

use std::{future::Future, net::SocketAddr};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    response::{Html, IntoResponse},
    routing::get,
};
use fanout::{
    Broker, BrokerStats, Protocols,
    serve::TlsAcceptor,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn app(broker: Broker) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
        .with_state(broker)
}

/// Serves [`app`] on `listener` until `shutdown` resolves, over TLS when an
/// acceptor is given. Peer addresses are recorded so broadcasts can say who
/// asked for them.
pub async fn serve<F>(
    listener: TcpListener,
    broker: Broker,
    tls: Option<TlsAcceptor>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    fanout::serve::serve(listener, app(broker), tls, Protocols::Auto, shutdown).await
}

async fn upgrade(
    State(broker): State<Broker>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session::run(socket, broker, peer))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    stats: BrokerStats,
}

async fn health(State(broker): State<Broker>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        stats: broker.stats(),
    })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
