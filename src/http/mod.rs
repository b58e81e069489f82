//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → routing::RuleSet::route (blocking pool)
//!     ├─ Local → tower_http ServeDir (public dir, SPA fallback to index.html)
//!     └─ Proxy → forward.rs (URL rebase, Host/Origin rewrite, X-Forwarded-*)
//!                 → upstream client (direct or through the agent)
//!                 → response.rs on failure (500 naming the request)
//!                 → websocket.rs on 101 (byte tunnel)
//! ```

pub mod forward;
pub mod response;
pub mod server;
pub mod websocket;

pub use response::ProxyFailure;
pub use server::DevServer;
