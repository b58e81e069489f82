//! Host network presence.

use std::fmt::Debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// Reports whether the machine currently has a usable network interface.
pub trait HostNetwork: Send + Sync + Debug {
    fn has_active_interface(&self) -> io::Result<bool>;
}

/// Asks the OS routing table.
///
/// Connecting a UDP socket sends nothing; it only selects the outgoing
/// interface. With no route the connect fails; otherwise the chosen local
/// address tells us whether that interface is more than loopback.
///
/// This answers "is there a route off this host", which is narrower than
/// "is some interface up with an address": a machine holding a LAN address
/// but no default route reports `false` here, so `localhost` targets get
/// pinned to `127.0.0.1` there as well. Pinning is harmless in that case.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNetwork;

const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

impl HostNetwork for SystemNetwork {
    fn has_active_interface(&self) -> io::Result<bool> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(ROUTE_PROBE)?;
        let local = socket.local_addr()?.ip();
        Ok(!local.is_loopback() && !local.is_unspecified())
    }
}
