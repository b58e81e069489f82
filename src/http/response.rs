//! Upstream failure responses.
//!
//! # Responsibilities
//! - Map a failed upstream exchange to `500 Internal Server Error`
//! - Name the request, the originating host, the target and the error code
//!
//! # Design Decisions
//! - Answer immediately; a silent drop leaves the browser waiting for an
//!   empty response
//! - Never retried

use axum::{
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::http::forward::error_code;
use crate::routing::RoutingRule;

/// A request that could not be proxied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyFailure {
    pub method: String,
    pub url: String,
    pub host: String,
    pub target: String,
    pub code: &'static str,
}

impl ProxyFailure {
    pub fn new(parts: &Parts, rule: &RoutingRule, code: &'static str) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            method: parts.method.to_string(),
            url,
            host,
            target: rule.target.to_string(),
            code,
        }
    }

    pub fn from_error(parts: &Parts, rule: &RoutingRule, err: &reqwest::Error) -> Self {
        Self::new(parts, rule, error_code(err))
    }

    /// Operator-facing diagnostic.
    pub fn log(&self, cause: &dyn std::error::Error) {
        tracing::error!(
            method = %self.method,
            url = %self.url,
            host = %self.host,
            target = %self.target,
            code = self.code,
            error = %cause,
            "Proxy error: could not proxy request"
        );
    }
}

impl fmt::Display for ProxyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Proxy error: Could not proxy request {} {} from {} to {} ({}).",
            self.method, self.url, self.host, self.target, self.code
        )
    }
}

impl IntoResponse for ProxyFailure {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use url::Url;

    fn parts(uri: &str, host: Option<&str>) -> Parts {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(host) = host {
            builder = builder.header("host", host);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn rule() -> RoutingRule {
        RoutingRule {
            context_prefix: "/api".into(),
            target: Url::parse("http://127.0.0.1:4000").unwrap(),
            use_agent: false,
            is_direct_ip: true,
        }
    }

    #[test]
    fn test_message_names_everything() {
        let failure = ProxyFailure::new(&parts("/api/login?next=/", Some("localhost:3000")), &rule(), "ECONNREFUSED");
        assert_eq!(
            failure.to_string(),
            "Proxy error: Could not proxy request POST /api/login?next=/ from localhost:3000 to http://127.0.0.1:4000/ (ECONNREFUSED)."
        );
    }

    #[test]
    fn test_missing_host() {
        let failure = ProxyFailure::new(&parts("/api", None), &rule(), "ETIMEDOUT");
        assert_eq!(failure.host, "unknown");
    }

    #[tokio::test]
    async fn test_into_response_is_500() {
        let failure = ProxyFailure::new(&parts("/api/x", Some("localhost:3000")), &rule(), "ECONNRESET");
        let response = failure.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("/api/x"));
        assert!(body.contains("localhost:3000"));
        assert!(body.contains("http://127.0.0.1:4000/"));
        assert!(body.contains("ECONNRESET"));
    }
}
