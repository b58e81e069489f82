//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Detect upgrade requests
//! - Relay the upstream `101 Switching Protocols` to the client
//! - Splice the two upgraded connections together
//!
//! # Data Flow
//! ```text
//! Client ←──── raw bytes ────→ Proxy ←──── raw bytes ────→ Backend
//! ```
//!
//! # Design Decisions
//! - Byte-level tunnel after the handshake (no frame parsing)
//! - Either side closing ends the tunnel, and so does server shutdown

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tokio::sync::broadcast;

/// True for `Connection: upgrade` requests naming a protocol.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    connection_upgrade && headers.contains_key(header::UPGRADE)
}

/// Answer the client with the upstream handshake and start the tunnel.
///
/// The tunnel closes when `closed` fires.
pub fn switch_protocols(
    client: OnUpgrade,
    upstream: reqwest::Response,
    path: String,
    closed: broadcast::Receiver<()>,
) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    *response.headers_mut() = upstream.headers().clone();

    tokio::spawn(tunnel(client, upstream, path, closed));

    response
}

async fn tunnel(
    client: OnUpgrade,
    upstream: reqwest::Response,
    path: String,
    mut closed: broadcast::Receiver<()>,
) {
    let mut upstream = match upstream.upgrade().await {
        Ok(io) => io,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Upstream WebSocket upgrade failed");
            return;
        }
    };
    let mut client = match client.await {
        Ok(upgraded) => TokioIo::new(upgraded),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Client WebSocket upgrade failed");
            return;
        }
    };

    tracing::debug!(path = %path, "WebSocket tunnel open");
    tokio::select! {
        result = tokio::io::copy_bidirectional(&mut client, &mut upstream) => match result {
            Ok((sent, received)) => {
                tracing::debug!(path = %path, sent, received, "WebSocket tunnel closed");
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "WebSocket tunnel ended with error");
            }
        },
        _ = closed.recv() => {
            tracing::debug!(path = %path, "WebSocket tunnel closed for shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_upgrade_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert!(is_upgrade_request(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        assert!(!is_upgrade_request(&headers));
    }
}
