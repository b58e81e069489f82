//! Reachability probing for the forward-proxy agent.

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

/// Answers whether something is listening at `host:port`.
pub trait ReachabilityProbe: Send + Sync {
    fn is_reachable(&self, host_port: &str) -> impl Future<Output = io::Result<bool>> + Send;
}

/// Probes with a plain TCP connect.
#[derive(Debug, Clone, Copy)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ReachabilityProbe for TcpProbe {
    fn is_reachable(&self, host_port: &str) -> impl Future<Output = io::Result<bool>> + Send {
        let timeout = self.timeout;
        let target = host_port.to_string();
        async move {
            match time::timeout(timeout, TcpStream::connect(target.as_str())).await {
                Ok(Ok(_stream)) => Ok(true),
                Ok(Err(e)) if is_refusal(&e) => Ok(false),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no answer from {target} within {timeout:?}"),
                )),
            }
        }
    }
}

fn is_refusal(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
    )
}

/// Run the probe once, folding every failure into `false`.
pub async fn probe_reachable<P: ReachabilityProbe>(probe: &P, host_port: &str) -> bool {
    match probe.is_reachable(host_port).await {
        Ok(reachable) => {
            tracing::debug!(target = %host_port, reachable, "Agent reachability probed");
            reachable
        }
        Err(e) => {
            tracing::debug!(target = %host_port, error = %e, "Agent probe failed, treating as unreachable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_probe_finds_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new(Duration::from_secs(2));
        assert!(probe.is_reachable(&addr.to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_tcp_probe_closed_port() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let probe = TcpProbe::new(Duration::from_secs(2));
        assert!(!probe_reachable(&probe, &addr.to_string()).await);
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_unreachable() {
        let probe = TcpProbe::new(Duration::from_millis(500));
        assert!(!probe_reachable(&probe, "not a host").await);
    }
}
