//! Routing table compilation.
//!
//! # Responsibilities
//! - Validate every target (scheme, URL syntax)
//! - Probe the forward-proxy agent once and share the result across rules
//! - Sort contexts longest first
//! - Apply loopback normalization when asked to
//!
//! # Design Decisions
//! - All targets are validated before the probe so a typo fails fast
//! - The finished `RuleSet` is never mutated; rebuild to change it

use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::config::DevServerConfig;
use crate::net::{probe_reachable, HostNetwork, ReachabilityProbe, SystemNetwork};
use crate::routing::error::RouteConfigError;
use crate::routing::files::{DiskFiles, LocalFiles};
use crate::routing::loopback::resolve_loopback;
use crate::routing::matcher::RuleSet;
use crate::routing::proxy_spec::ProxySpec;
use crate::routing::rule::{is_direct_ip, parse_target, RoutingRule};

/// Path prefix of the build tool's live-reload channel.
pub const DEFAULT_SIDECAR_PREFIX: &str = "/sockjs-node";

/// Compile a `ProxySpec` with default collaborators.
///
/// `None` means proxying is disabled.
pub async fn build<P: ReachabilityProbe>(
    spec: Option<&ProxySpec>,
    public_root: impl Into<PathBuf>,
    agent_address: Option<&str>,
    probe: &P,
) -> Result<Option<RuleSet>, RouteConfigError> {
    let mut builder = RuleSetBuilder::new(public_root);
    if let Some(addr) = agent_address {
        builder = builder.agent_address(addr);
    }
    builder.build(spec, probe).await
}

/// Configurable `RuleSet` construction.
#[derive(Debug)]
pub struct RuleSetBuilder {
    public_root: PathBuf,
    agent_address: Option<String>,
    normalize_loopback: bool,
    sidecar_prefix: String,
    files: Arc<dyn LocalFiles>,
    network: Arc<dyn HostNetwork>,
}

impl RuleSetBuilder {
    pub fn new(public_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
            agent_address: None,
            normalize_loopback: cfg!(windows),
            sidecar_prefix: DEFAULT_SIDECAR_PREFIX.to_string(),
            files: Arc::new(DiskFiles),
            network: Arc::new(SystemNetwork),
        }
    }

    /// Builder pre-filled from the server configuration.
    pub fn from_config(config: &DevServerConfig) -> Self {
        let mut builder = Self::new(config.public_dir.clone())
            .normalize_loopback(config.normalize_loopback)
            .sidecar_prefix(config.sidecar_prefix.clone());
        if let Some(addr) = &config.agent.address {
            builder = builder.agent_address(addr.clone());
        }
        builder
    }

    /// Forward proxy (`host:port`) used for non-IP targets when reachable.
    pub fn agent_address(mut self, address: impl Into<String>) -> Self {
        self.agent_address = Some(address.into());
        self
    }

    pub fn normalize_loopback(mut self, enabled: bool) -> Self {
        self.normalize_loopback = enabled;
        self
    }

    pub fn sidecar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sidecar_prefix = prefix.into();
        self
    }

    pub fn files(mut self, files: Arc<dyn LocalFiles>) -> Self {
        self.files = files;
        self
    }

    pub fn network(mut self, network: Arc<dyn HostNetwork>) -> Self {
        self.network = network;
        self
    }

    /// Validate, probe and freeze.
    pub async fn build<P: ReachabilityProbe>(
        self,
        spec: Option<&ProxySpec>,
        probe: &P,
    ) -> Result<Option<RuleSet>, RouteConfigError> {
        let Some(spec) = spec else {
            return Ok(None);
        };

        let mut entries = spec
            .entries()
            .into_iter()
            .map(|(context, raw)| Ok((context.to_string(), parse_target(raw)?)))
            .collect::<Result<Vec<(String, Url)>, RouteConfigError>>()?;

        // Stable: equal-length contexts keep configuration order.
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

        let agent = match &self.agent_address {
            Some(address) if probe_reachable(probe, address).await => agent_url(address),
            _ => None,
        };
        let reachable = agent.is_some();

        let rules = entries
            .into_iter()
            .map(|(context_prefix, target)| {
                let is_direct_ip = is_direct_ip(&target);
                let target = if self.normalize_loopback {
                    resolve_loopback(&target, self.network.as_ref())
                } else {
                    target
                };
                RoutingRule {
                    context_prefix,
                    target,
                    use_agent: reachable && !is_direct_ip,
                    is_direct_ip,
                }
            })
            .collect::<Vec<_>>();

        for rule in &rules {
            tracing::info!(
                context = %rule.context_prefix,
                target = %rule.target,
                use_agent = rule.use_agent,
                direct_ip = rule.is_direct_ip,
                "Proxy rule compiled"
            );
        }

        Ok(Some(RuleSet::new(
            rules,
            self.public_root,
            self.sidecar_prefix,
            agent,
            self.files,
        )))
    }
}

fn agent_url(address: &str) -> Option<Url> {
    match Url::parse(&format!("http://{address}")) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(address = %address, error = %e, "Agent address is not a valid host:port, ignoring");
            None
        }
    }
}
