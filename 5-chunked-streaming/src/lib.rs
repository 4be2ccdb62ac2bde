//! Streaming response plumbing with no broker involved: a bulk byte stream
//! for bandwidth tests, a slow chunked text response and a response whose
//! headers arrive late.

pub mod cli;

use std::{convert::Infallible, time::Duration};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::Query,
    http::{HeaderName, header},
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use futures::stream;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

pub const DEFAULT_STREAM_SIZE: usize = 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_CHUNK_COUNT: usize = 10;
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 500;
pub const DEFAULT_SLOW_DELAY_MS: u64 = 2000;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn app() -> Router {
    Router::new()
        .route("/stream", get(byte_stream))
        .route("/chunked", get(chunked))
        .route("/slow", get(slow_headers))
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
}

/// Query values arrive as strings; anything missing, unparsable or not
/// positive falls back to the endpoint's default.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    size: Option<String>,
    chunk: Option<String>,
    count: Option<String>,
    delay: Option<String>,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

impl StreamParams {
    fn size(&self) -> usize {
        positive(self.size.as_deref()).map_or(DEFAULT_STREAM_SIZE, |v| v as usize)
    }

    fn chunk(&self) -> usize {
        positive(self.chunk.as_deref()).map_or(DEFAULT_CHUNK_SIZE, |v| v as usize)
    }

    fn count(&self) -> usize {
        positive(self.count.as_deref()).map_or(DEFAULT_CHUNK_COUNT, |v| v as usize)
    }

    fn delay_or(&self, default_ms: u64) -> Duration {
        Duration::from_millis(positive(self.delay.as_deref()).unwrap_or(default_ms))
    }
}

async fn byte_stream(Query(params): Query<StreamParams>) -> impl IntoResponse {
    let size = params.size();
    let chunk_size = params.chunk();
    let delay = params.delay_or(0);
    info!(size, chunk_size, delay_ms = delay.as_millis() as u64, "starting stream");

    let mut block = vec![0u8; chunk_size];
    rand::thread_rng().fill(&mut block[..]);
    let block = Bytes::from(block);

    let body = stream::unfold(0usize, move |sent| {
        let block = block.clone();
        async move {
            if sent >= size {
                info!(sent, "stream complete");
                return None;
            }
            if sent > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let len = chunk_size.min(size - sent);
            Some((Ok::<_, Infallible>(block.slice(..len)), sent + len))
        }
    });

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (HeaderName::from_static("x-content-size"), size.to_string()),
            (HeaderName::from_static("x-chunk-size"), chunk_size.to_string()),
        ],
        Body::from_stream(body),
    )
}

async fn chunked(Query(params): Query<StreamParams>) -> impl IntoResponse {
    let count = params.count();
    let delay = params.delay_or(DEFAULT_CHUNK_DELAY_MS);
    info!(count, delay_ms = delay.as_millis() as u64, "starting chunked response");

    let body = stream::unfold(1usize, move |index| async move {
        if index > count {
            info!(count, "chunked response complete");
            return None;
        }
        if index > 1 {
            tokio::time::sleep(delay).await;
        }
        let line = format!(
            "Chunk {index} of {count} at {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
        );
        Some((Ok::<_, Infallible>(line), index + 1))
    });

    ([(header::CONTENT_TYPE, "text/plain")], Body::from_stream(body))
}

async fn slow_headers(Query(params): Query<StreamParams>) -> Json<Value> {
    let delay = params.delay_or(DEFAULT_SLOW_DELAY_MS);
    info!(delay_ms = delay.as_millis() as u64, "delaying response headers");
    tokio::time::sleep(delay).await;
    Json(json!({ "status": "ok", "delayed": true }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
