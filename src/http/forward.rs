//! Upstream request construction.
//!
//! # Responsibilities
//! - Hold the upstream clients (direct, and through the forward-proxy agent)
//! - Rebase the request path onto the rule's target
//! - Rewrite `Host` and `Origin`, add `X-Forwarded-*`
//! - Strip hop-by-hop headers in both directions

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};
use std::net::SocketAddr;
use std::time::Duration;
use url::{Position, Url};

use crate::config::TimeoutConfig;
use crate::routing::RoutingRule;

const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PORT: &str = "x-forwarded-port";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Clients for upstream traffic.
///
/// Neither verifies certificates nor follows redirects; the browser should
/// see upstream redirects as they are.
#[derive(Debug, Clone)]
pub struct Upstream {
    direct: reqwest::Client,
    via_agent: Option<reqwest::Client>,
}

impl Upstream {
    pub fn new(agent: Option<&Url>, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let direct = client_builder(timeouts).no_proxy().build()?;
        let via_agent = match agent {
            Some(agent) => Some(
                client_builder(timeouts)
                    .proxy(reqwest::Proxy::all(agent.as_str())?)
                    .build()?,
            ),
            None => None,
        };
        Ok(Self { direct, via_agent })
    }

    /// The client a rule's traffic should use.
    pub fn client_for(&self, rule: &RoutingRule) -> &reqwest::Client {
        match (&self.via_agent, rule.use_agent) {
            (Some(client), true) => client,
            _ => &self.direct,
        }
    }
}

fn client_builder(timeouts: &TimeoutConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .http1_only()
}

/// Target URL with the request path appended and the request query kept.
pub fn upstream_url(target: &Url, uri: &Uri) -> Url {
    let mut url = target.clone();
    let base = target.path().trim_end_matches('/');
    url.set_path(&format!("{base}{}", uri.path()));
    if let Some(query) = uri.query() {
        url.set_query(Some(query));
    }
    url
}

/// `host[:port]` of a URL, as it belongs in a `Host` header.
pub fn authority(url: &Url) -> &str {
    &url[Position::BeforeHost..Position::AfterPort]
}

/// Headers for the upstream request.
///
/// `upgrade` keeps `Connection`/`Upgrade` so WebSocket handshakes survive.
pub fn forward_headers(
    incoming: &HeaderMap,
    rule: &RoutingRule,
    client: SocketAddr,
    upgrade: bool,
) -> HeaderMap {
    let mut headers = incoming.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);

    if upgrade {
        headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
        if let Some(protocol) = incoming.get(header::UPGRADE) {
            headers.insert(header::UPGRADE, protocol.clone());
        }
    }

    if let Ok(host) = HeaderValue::from_str(authority(&rule.target)) {
        headers.insert(header::HOST, host);
    }

    if headers.contains_key(header::ORIGIN) {
        if let Ok(origin) = HeaderValue::from_str(&rule.target_origin()) {
            headers.insert(header::ORIGIN, origin);
        }
    }

    let original_host = incoming.get(header::HOST).and_then(|h| h.to_str().ok());
    let port = original_host
        .and_then(|h| h.rsplit_once(':'))
        .map(|(_, port)| port)
        .filter(|port| port.parse::<u16>().is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| "80".to_string());
    let proto = if upgrade { "ws" } else { "http" };

    append_forwarded(&mut headers, X_FORWARDED_FOR, &client.ip().to_string());
    append_forwarded(&mut headers, X_FORWARDED_PORT, &port);
    append_forwarded(&mut headers, X_FORWARDED_PROTO, proto);
    if let Some(host) = original_host {
        let name = HeaderName::from_static(X_FORWARDED_HOST);
        if !headers.contains_key(&name) {
            if let Ok(value) = HeaderValue::from_str(host) {
                headers.insert(name, value);
            }
        }
    }

    headers
}

fn append_forwarded(headers: &mut HeaderMap, name: &'static str, value: &str) {
    let name = HeaderName::from_static(name);
    let combined = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing},{value}"),
        None => value.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&combined) {
        headers.insert(name, value);
    }
}

/// Remove hop-by-hop headers, including any the `Connection` header names.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for name in listed {
        headers.remove(name.as_str());
    }
}

/// Short, errno-style name for an upstream failure.
pub fn error_code(err: &reqwest::Error) -> &'static str {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            use std::io::ErrorKind;
            let code = match io.kind() {
                ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
                ErrorKind::ConnectionReset => Some("ECONNRESET"),
                ErrorKind::ConnectionAborted => Some("ECONNABORTED"),
                ErrorKind::TimedOut => Some("ETIMEDOUT"),
                ErrorKind::BrokenPipe => Some("EPIPE"),
                _ => None,
            };
            if let Some(code) = code {
                return code;
            }
        }
        if e.to_string().contains("dns error") {
            return "ENOTFOUND";
        }
        source = e.source();
    }

    if err.is_timeout() {
        "ETIMEDOUT"
    } else {
        "EPROXY"
    }
}
