//! Long-polling transport over the fan-out broker.
//!
//! Clients never register with the broker. Each `GET /poll` is a bounded
//! wait against the history log: it answers at once when messages newer than
//! `since` are resident, otherwise it holds the request open until something
//! is published or the timeout runs out and answers with an empty batch.
//!
//! - [`cli`] parses flags for the binary.
//! - [`autogen`] publishes canned notices in the background.
//! - [`error`] maps request validation failures to HTTP responses.

pub mod autogen;
pub mod cli;
pub mod error;

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use fanout::{Broker, BrokerStats, Message, MessageId};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_TIMEOUT_SECS: u64 = 60;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn app(broker: Broker) -> Router {
    Router::new()
        .route("/poll", get(poll))
        .route("/send", post(send))
        .route("/messages", get(messages))
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
        .with_state(broker)
}

/// Raw query parameters. Parsed leniently: anything unusable falls back to
/// the default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PollParams {
    since: Option<String>,
    timeout: Option<String>,
}

impl PollParams {
    pub fn since(&self) -> MessageId {
        self.since
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(0, |id| id.max(0) as MessageId)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBatch {
    pub messages: Vec<Message>,
    pub count: usize,
}

impl From<Vec<Message>> for MessageBatch {
    fn from(messages: Vec<Message>) -> Self {
        Self {
            count: messages.len(),
            messages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    stats: BrokerStats,
}

async fn poll(
    State(broker): State<Broker>,
    Query(params): Query<PollParams>,
) -> Json<MessageBatch> {
    let since = params.since();
    let timeout = params.timeout();
    info!(since, timeout_secs = timeout.as_secs(), "poll request");

    Json(broker.wait(since, timeout).await.into())
}

async fn send(
    State(broker): State<Broker>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::InvalidJson(rejection.body_text()))?;
    if request.text.is_empty() {
        return Err(ApiError::MissingText);
    }

    let message = broker.publish(request.text);
    info!(id = message.id, text = %message.text, "new message");
    Ok(Json(message))
}

async fn messages(State(broker): State<Broker>) -> Json<MessageBatch> {
    Json(broker.messages().into())
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
