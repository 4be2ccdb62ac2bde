//! Protocol negotiation demo: reports which HTTP version and TLS session a
//! request arrived on, streams lines over one long response and answers
//! delayed requests that HTTP/2 clients can run side by side on a single
//! connection.

pub mod cli;

use std::{collections::BTreeMap, convert::Infallible, net::SocketAddr, time::Duration};

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{ConnectInfo, Query},
    http::{HeaderMap, Method, Uri, Version, header},
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use fanout::TlsInfo;
use futures::stream;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const DEFAULT_MULTIPLEX_COUNT: u64 = 5;
pub const MAX_MULTIPLEX_COUNT: u64 = 20;
pub const DEFAULT_MULTIPLEX_DELAY_MS: u64 = 200;
pub const DEFAULT_CONCURRENT_DELAY_MS: u64 = 100;

const PUSH_UNSUPPORTED: &str = "Server push not available (HTTP/1.1 or push disabled)";
const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn app() -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/push", get(push))
        .route("/pushed-resource-1", get(pushed_resource))
        .route("/pushed-resource-2", get(pushed_resource))
        .route("/pushed-resource-3", get(pushed_resource))
        .route("/multiplex", get(multiplex))
        .route("/concurrent", get(concurrent))
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
}

/// Protocol name as HTTP clients print it, e.g. `HTTP/1.1` or `HTTP/2.0`.
pub fn protocol_name(version: Version) -> String {
    format!("{version:?}")
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub protocol: String,
    pub method: String,
    pub url: String,
    pub host: String,
    pub remote_addr: String,
    /// `none` for cleartext, otherwise the negotiated version and cipher.
    pub tls: String,
    pub headers: BTreeMap<String, String>,
}

async fn info(
    peer: Option<ConnectInfo<SocketAddr>>,
    tls: Option<Extension<TlsInfo>>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
) -> Json<ConnectionInfo> {
    // HTTP/2 carries the host in the :authority pseudo-header, not in Host.
    let host = uri
        .authority()
        .map(|authority| authority.to_string())
        .or_else(|| {
            headers
                .get(header::HOST)
                .map(|host| String::from_utf8_lossy(host.as_bytes()).into_owned())
        })
        .unwrap_or_default();
    let tls = match tls {
        Some(Extension(tls)) => format!("version={}, cipher={}", tls.version, tls.cipher),
        None => "none".to_string(),
    };

    let mut joined = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        joined.insert(name.as_str().to_string(), values.join(", "));
    }

    let info = ConnectionInfo {
        protocol: protocol_name(version),
        method: method.to_string(),
        url: uri.to_string(),
        host,
        remote_addr: peer
            .map_or_else(|| "unknown".to_string(), |ConnectInfo(peer)| peer.to_string()),
        tls,
        headers: joined,
    };
    info!(
        protocol = %info.protocol,
        remote = %info.remote_addr,
        tls = %info.tls,
        "connection info"
    );
    Json(info)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReport {
    pub push_supported: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pushed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// hyper never sends PUSH_PROMISE frames, so every client gets the
/// unsupported report. The pushed resources stay reachable as plain routes.
async fn push(version: Version) -> Json<PushReport> {
    debug!(protocol = %protocol_name(version), "server push requested");
    Json(PushReport {
        push_supported: false,
        pushed: Vec::new(),
        message: Some(PUSH_UNSUPPORTED.to_string()),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushedResource {
    pub resource: String,
    pub timestamp: String,
}

async fn pushed_resource(uri: Uri) -> impl IntoResponse {
    let resource = PushedResource {
        resource: uri.path().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    ([(header::CACHE_CONTROL, "max-age=3600")], Json(resource))
}

/// Query values arrive as strings; anything missing, unparsable or out of
/// range falls back to the endpoint's default.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    id: Option<String>,
    count: Option<String>,
    delay: Option<String>,
}

fn within(raw: Option<&str>, accept: impl Fn(u64) -> bool) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| accept(*value))
}

impl Params {
    fn count(&self) -> u64 {
        within(self.count.as_deref(), |count| (1..=MAX_MULTIPLEX_COUNT).contains(&count))
            .unwrap_or(DEFAULT_MULTIPLEX_COUNT)
    }

    fn delay_or(&self, default_ms: u64) -> Duration {
        Duration::from_millis(within(self.delay.as_deref(), |_| true).unwrap_or(default_ms))
    }
}

async fn multiplex(version: Version, Query(params): Query<Params>) -> impl IntoResponse {
    let count = params.count();
    let delay = params.delay_or(DEFAULT_MULTIPLEX_DELAY_MS);
    let protocol = protocol_name(version);
    info!(count, delay_ms = delay.as_millis() as u64, %protocol, "starting multiplex stream");

    let body = stream::unfold(1u64, move |index| {
        let protocol = protocol.clone();
        async move {
            if index > count {
                return None;
            }
            if index > 1 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let line = format!("Message {index}/{count} at {} (proto: {protocol})\n", now());
            Some((Ok::<_, Infallible>(line), index + 1))
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrentReply {
    pub request_id: String,
    pub delay_ms: u64,
    pub protocol: String,
    pub timestamp: String,
}

async fn concurrent(version: Version, Query(params): Query<Params>) -> Json<ConcurrentReply> {
    let delay = params.delay_or(DEFAULT_CONCURRENT_DELAY_MS);
    tokio::time::sleep(delay).await;
    Json(ConcurrentReply {
        request_id: params.id.unwrap_or_default(),
        delay_ms: delay.as_millis() as u64,
        protocol: protocol_name(version),
        timestamp: now(),
    })
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
