use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = chunked_streaming::app()
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn byte_stream_sends_exact_size() {
    let (status, headers, body) = get("/stream?size=100000&chunk=4096").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.len(), 100_000);
    assert_eq!(headers["content-type"], "application/octet-stream");
    assert_eq!(headers["x-content-size"], "100000");
    assert_eq!(headers["x-chunk-size"], "4096");
}

#[tokio::test]
async fn byte_stream_handles_partial_final_chunk() {
    let (_, _, body) = get("/stream?size=10&chunk=4&delay=1").await;

    assert_eq!(body.len(), 10);
}

#[tokio::test]
async fn chunked_emits_numbered_lines() {
    let (status, _, body) = get("/chunked?count=3&delay=5").await;
    let text = String::from_utf8(body).expect("utf-8 body");
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Chunk 1 of 3 at "));
    assert!(lines[2].starts_with("Chunk 3 of 3 at "));
}

#[tokio::test]
async fn slow_endpoint_reports_delay() {
    let (status, _, body) = get("/slow?delay=10").await;
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json body");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "ok");
    assert_eq!(value["delayed"], true);
}
