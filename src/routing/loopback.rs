//! Loopback normalization.
//!
//! Some platforms resolve `localhost` to `::1` first while most dev backends
//! only listen on IPv4. When the machine is offline there is nothing else to
//! resolve against, so `localhost` is pinned to `127.0.0.1`.

use url::Url;

use crate::net::HostNetwork;

pub const IPV4_LOOPBACK: &str = "127.0.0.1";

/// Rewrite a `localhost` target to `127.0.0.1` when the host has no active
/// network interface.
///
/// Only the host changes; scheme, credentials, port, path and query are kept.
/// A failed interface check counts as offline.
pub fn resolve_loopback(target: &Url, network: &dyn HostNetwork) -> Url {
    if target.host_str() != Some("localhost") {
        return target.clone();
    }

    let online = match network.has_active_interface() {
        Ok(online) => online,
        Err(e) => {
            tracing::debug!(error = %e, "Network interface check failed, assuming offline");
            false
        }
    };
    if online {
        return target.clone();
    }

    let mut rewritten = target.clone();
    if rewritten.set_host(Some(IPV4_LOOPBACK)).is_err() {
        return target.clone();
    }
    tracing::debug!(from = %target, to = %rewritten, "Pinned localhost target to IPv4 loopback");
    rewritten
}
