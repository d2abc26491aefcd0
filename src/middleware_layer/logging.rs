use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// The client's address, or "unknown" when the server was not started with
/// connect info.
fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(
        ip = %client_addr(&request),
        proto = ?request.version(),
        method = %request.method(),
        uri = %request.uri(),
        "received request"
    );

    next.run(request).await
}
