//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Rule Compilation (at startup):
//!     raw "proxy" value (TOML / package.json)
//!     → proxy_spec.rs (string or prefix → target table)
//!     → builder.rs (validate targets, probe agent once, sort by prefix length)
//!     → loopback.rs (optional localhost → 127.0.0.1 rewrite)
//!     → Freeze as immutable RuleSet
//!
//! Incoming Request (method, path):
//!     → matcher.rs (sidecar exclusion, prefix match, GET + local file check)
//!     → Return: Proxy(rule) or Local
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Longest prefix first; ties keep configuration order
//! - First match wins
//! - Configuration mistakes are typed errors, never process exits

pub mod builder;
pub mod error;
pub mod files;
pub mod loopback;
pub mod matcher;
pub mod proxy_spec;
pub mod rule;

pub use builder::{build, RuleSetBuilder, DEFAULT_SIDECAR_PREFIX};
pub use error::RouteConfigError;
pub use files::{DiskFiles, LocalFiles};
pub use matcher::{RoutingDecision, RuleSet};
pub use proxy_spec::ProxySpec;
pub use rule::RoutingRule;
