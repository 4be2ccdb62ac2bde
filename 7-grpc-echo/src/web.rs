//! HTTP side server: the client page and a `/health` that round-trips
//! through the gRPC health service.

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::proto::{HealthCheckRequest, health_service_client::HealthServiceClient};

pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn app(grpc_addr: SocketAddr) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
        .with_state(grpc_addr)
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

async fn health(State(grpc_addr): State<SocketAddr>) -> Response {
    let check = async {
        let mut client = HealthServiceClient::connect(format!("http://{grpc_addr}"))
            .await
            .map_err(|err| ("gRPC server unavailable", err.to_string()))?;
        client
            .check(HealthCheckRequest {})
            .await
            .map(|response| response.into_inner().status)
            .map_err(|status| ("Health check failed", status.to_string()))
    };

    match tokio::time::timeout(HEALTH_TIMEOUT, check).await {
        Ok(Ok(status)) => Json(Health { status }).into_response(),
        Ok(Err((reason, err))) => {
            warn!(%grpc_addr, error = %err, "{reason}");
            (StatusCode::SERVICE_UNAVAILABLE, reason).into_response()
        }
        Err(_) => {
            warn!(%grpc_addr, "health check timed out");
            (StatusCode::SERVICE_UNAVAILABLE, "Health check failed").into_response()
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
