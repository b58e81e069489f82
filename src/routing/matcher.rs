//! Per-request proxy decisions.
//!
//! # Responsibilities
//! - Keep the live-reload channel local, always
//! - Pick the first rule whose context prefixes the path
//! - Let files present in the public directory win over the proxy for `GET`
//!
//! # Design Decisions
//! - Static assets are fetched with `GET`; anything else is an API call
//! - The `Accept` header is not consulted
//! - File presence is checked on every request (rebuilds change it)

use axum::http::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::routing::files::{public_path, LocalFiles};
use crate::routing::rule::RoutingRule;

/// Outcome of routing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision<'a> {
    /// Forward to the rule's target.
    Proxy(&'a RoutingRule),
    /// Let the static server answer.
    Local,
}

impl<'a> RoutingDecision<'a> {
    pub fn should_proxy(&self) -> bool {
        matches!(self, RoutingDecision::Proxy(_))
    }

    pub fn rule(&self) -> Option<&'a RoutingRule> {
        match self {
            RoutingDecision::Proxy(rule) => Some(rule),
            RoutingDecision::Local => None,
        }
    }
}

/// Immutable, priority-ordered routing table.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<RoutingRule>,
    public_root: PathBuf,
    sidecar_prefix: String,
    agent: Option<Url>,
    files: Arc<dyn LocalFiles>,
}

impl RuleSet {
    pub(crate) fn new(
        rules: Vec<RoutingRule>,
        public_root: PathBuf,
        sidecar_prefix: String,
        agent: Option<Url>,
        files: Arc<dyn LocalFiles>,
    ) -> Self {
        Self {
            rules,
            public_root,
            sidecar_prefix,
            agent,
            files,
        }
    }

    /// Rules in match order (longest context first).
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Forward proxy for rules with `use_agent`; `None` if it was unreachable.
    pub fn agent(&self) -> Option<&Url> {
        self.agent.as_ref()
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    pub fn sidecar_prefix(&self) -> &str {
        &self.sidecar_prefix
    }

    /// Decide where a request goes.
    ///
    /// Performs a blocking filesystem check for `GET` requests.
    pub fn route(&self, method: &Method, pathname: &str) -> RoutingDecision<'_> {
        if pathname.starts_with(&self.sidecar_prefix) {
            return RoutingDecision::Local;
        }

        let Some(rule) = self.rules.iter().find(|r| r.matches_path(pathname)) else {
            return RoutingDecision::Local;
        };

        if *method != Method::GET || !self.is_public_file(pathname) {
            RoutingDecision::Proxy(rule)
        } else {
            RoutingDecision::Local
        }
    }

    fn is_public_file(&self, pathname: &str) -> bool {
        match public_path(&self.public_root, pathname) {
            Some(path) => self.files.exists(&path),
            None => false,
        }
    }
}
