//! A single compiled routing rule.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::routing::error::RouteConfigError;

/// One `context → target` entry, ready to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// Path prefix selecting this rule (`/` for a single target).
    pub context_prefix: String,
    /// Absolute upstream URL.
    pub target: Url,
    /// Send upstream traffic through the forward-proxy agent.
    pub use_agent: bool,
    /// Target host is a literal IPv4 address.
    pub is_direct_ip: bool,
}

impl RoutingRule {
    /// Whether this rule's context covers `pathname`.
    pub fn matches_path(&self, pathname: &str) -> bool {
        pathname.starts_with(&self.context_prefix)
    }

    /// `scheme://host[:port]` of the target.
    pub fn target_origin(&self) -> String {
        self.target.origin().ascii_serialization()
    }
}

/// Check the raw target string and parse it.
///
/// The scheme test runs on the raw text so `HTTP://` or `ftp://` are both
/// rejected before URL parsing gets a chance to normalise them.
pub(crate) fn parse_target(raw: &str) -> Result<Url, RouteConfigError> {
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(RouteConfigError::InvalidScheme {
            target: raw.to_string(),
        });
    }
    Url::parse(raw).map_err(|source| RouteConfigError::InvalidUrl {
        target: raw.to_string(),
        source,
    })
}

/// True when the target's `host[:port]` is a dotted-quad IPv4 literal.
///
/// Hostnames and IPv6 literals never count.
pub fn is_direct_ip(target: &Url) -> bool {
    static DIRECT_IP: OnceLock<Regex> = OnceLock::new();
    let pattern = DIRECT_IP.get_or_init(|| {
        Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}(?::\d{1,5})?$").expect("static pattern")
    });

    let Some(host) = target.host_str() else {
        return false;
    };
    let host_port = match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    pattern.is_match(&host_port)
}
