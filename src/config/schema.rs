//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML file.
//! The `proxy` value is kept raw here; `routing::ProxySpec` gives it a type.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::routing::DEFAULT_SIDECAR_PREFIX;

/// Root configuration for the dev server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Directory of statically served files.
    pub public_dir: PathBuf,

    /// Target URL, or a table of context prefix → target URL.
    pub proxy: Option<toml::Value>,

    /// Live-reload channel prefix that is never proxied.
    pub sidecar_prefix: String,

    /// Rewrite `localhost` targets to `127.0.0.1` when offline.
    pub normalize_loopback: bool,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Optional forward proxy for upstream traffic.
    pub agent: AgentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            proxy: None,
            sidecar_prefix: DEFAULT_SIDECAR_PREFIX.to_string(),
            normalize_loopback: cfg!(windows),
            listener: ListenerConfig::default(),
            agent: AgentConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Forward-proxy agent settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent address (`host:port`). Probed once at startup.
    pub address: Option<String>,

    /// How long the startup probe may take, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: None,
            probe_timeout_ms: 1000,
        }
    }
}

/// Timeout configuration for upstream traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// How long a proxied request may wait for upstream response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 120,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body forwarded upstream, in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
