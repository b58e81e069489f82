//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / http produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, off by default)
//! ```

pub mod logging;
pub mod metrics;
