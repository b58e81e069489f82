//! Development server proxy.
//!
//! Decides per request whether a backend or the local static server answers,
//! and forwards the former.

pub mod config;
pub mod http;
pub mod net;
pub mod routing;

pub mod lifecycle;
pub mod observability;

pub use config::DevServerConfig;
pub use http::DevServer;
pub use lifecycle::Shutdown;
pub use routing::{build, ProxySpec, RoutingDecision, RoutingRule, RuleSet, RuleSetBuilder};
