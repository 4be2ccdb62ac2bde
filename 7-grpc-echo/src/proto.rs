//! Wire messages of the `echo` package and the generated service stubs.

#[derive(Clone, PartialEq, prost::Message)]
pub struct EchoRequest {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EchoResponse {
    #[prost(string, tag = "1")]
    pub message: String,
    /// Unix seconds.
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamRequest {
    #[prost(int32, tag = "1")]
    pub count: i32,
    #[prost(int32, tag = "2")]
    pub delay_ms: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamResponse {
    #[prost(int32, tag = "1")]
    pub index: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientStreamResponse {
    #[prost(int32, tag = "1")]
    pub count: i32,
    #[prost(string, repeated, tag = "2")]
    pub messages: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthCheckRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthCheckResponse {
    #[prost(string, tag = "1")]
    pub status: String,
}

include!(concat!(env!("OUT_DIR"), "/echo.EchoService.rs"));
include!(concat!(env!("OUT_DIR"), "/echo.HealthService.rs"));
