//! Server-Sent Events transport over the fan-out broker.
//!
//! Every `GET /events` request registers one subscriber and turns its queue
//! into an event stream: a `connected` event first, then one `data:` frame
//! per delivered payload. When the client goes away axum drops the stream,
//! which drops the [`Subscription`] and unregisters it.

pub mod cli;
pub mod ticker;

use std::{borrow::Cow, convert::Infallible};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use fanout::{Broker, BrokerStats, Subscription};
use futures::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

const INDEX_HTML: &str = include_str!("../static/index.html");
const CONNECTED: &str = r#"{"status":"connected"}"#;

pub fn app(broker: Broker) -> Router {
    Router::new()
        .route("/events", get(events))
        .route("/broadcast", get(broadcast))
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
        .with_state(broker)
}

/// Turns a subscription into SSE frames, starting with the `connected`
/// acknowledgment. Ends when the subscriber is unregistered.
pub fn event_stream(
    subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let connected =
        stream::once(async { Ok(Event::default().event("connected").data(CONNECTED)) });
    let deliveries = stream::unfold(subscription, |mut subscription| async move {
        let payload = subscription.recv().await?;
        Some((Ok(Event::default().data(data_lines(&payload))), subscription))
    });
    connected.chain(deliveries)
}

/// SSE fields are line based and a bare `\r` is a line break to clients, so
/// every line ending becomes `\n` and is split into `data:` lines.
fn data_lines(payload: &str) -> Cow<'_, str> {
    if payload.contains('\r') {
        Cow::Owned(payload.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(payload)
    }
}

async fn events(State(broker): State<Broker>) -> impl IntoResponse {
    // Register before answering so anything broadcast after the client sees
    // `connected` is queued for it.
    let subscription = broker.register();
    info!(subscriber = %subscription.id(), "event stream opened");

    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Sse::new(event_stream(subscription)).keep_alive(KeepAlive::default()),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastParams {
    msg: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub status: String,
    pub delivered: usize,
}

async fn broadcast(
    State(broker): State<Broker>,
    Query(params): Query<BroadcastParams>,
) -> Json<BroadcastAck> {
    let text = params.msg.filter(|msg| !msg.is_empty()).unwrap_or_else(|| {
        format!(
            "Broadcast at {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    });

    let report = broker.broadcast(text);
    info!(
        delivered = report.delivered,
        dropped = report.dropped,
        "manual broadcast"
    );
    Json(BroadcastAck {
        status: "sent".to_string(),
        delivered: report.delivered,
    })
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
