// Service stubs are generated from Rust descriptions, so building needs no
// protoc. The message types they refer to live in src/proto.rs.
use tonic_build::manual::{Builder, Method, MethodBuilder, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn method(name: &str, route: &str, input: &str, output: &str) -> MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path(CODEC)
}

fn main() {
    let echo = Service::builder()
        .name("EchoService")
        .package("echo")
        .method(method("echo", "Echo", "EchoRequest", "EchoResponse").build())
        .method(
            method("server_stream", "ServerStream", "StreamRequest", "StreamResponse")
                .server_streaming()
                .build(),
        )
        .method(
            method("client_stream", "ClientStream", "EchoRequest", "ClientStreamResponse")
                .client_streaming()
                .build(),
        )
        .method(
            method("bidirectional_stream", "BidirectionalStream", "EchoRequest", "StreamResponse")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    let health = Service::builder()
        .name("HealthService")
        .package("echo")
        .method(method("check", "Check", "HealthCheckRequest", "HealthCheckResponse").build())
        .build();

    Builder::new().compile(&[echo, health]);
}
