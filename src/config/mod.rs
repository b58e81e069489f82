//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! dev-proxy.toml (optional)          package.json (optional)
//!     → loader.rs (parse & deserialize)   → loader.rs ("proxy" field only)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!     → CLI flags override individual fields (main.rs)
//!     → routing builds the RuleSet from it once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_package_proxy, proxy_spec, ConfigError};
pub use schema::AgentConfig;
pub use schema::DevServerConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TimeoutConfig;
