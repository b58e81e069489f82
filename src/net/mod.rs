//! Network probes used while compiling the routing table.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     agent address ("host:port")
//!     → probe.rs (one TCP connect with timeout)
//!     → reachable: bool (any error → false)
//!
//!     localhost target + loopback normalization on
//!     → interfaces.rs (does the host have a routable address?)
//!     → keep "localhost" or pin 127.0.0.1
//! ```
//!
//! # Design Decisions
//! - Probes are unreliable by nature; callers degrade to `false`
//! - Both probes are traits so the routing table can be built in tests
//!   without touching the network

pub mod interfaces;
pub mod probe;

pub use interfaces::{HostNetwork, SystemNetwork};
pub use probe::{probe_reachable, ReachabilityProbe, TcpProbe};
