/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::byteorder::{hton16, hton32, ntoh16, ntoh32};
use crate::SocketError;

/// An IPv4 address plus port
///
/// The values are stored in host form; the `network_*` accessors provide the
/// network-order representation used on the wire. The default value is the
/// zeroed endpoint `0.0.0.0:0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    addr: SocketAddrV4,
}

impl Endpoint {
    pub const UNSPECIFIED: Endpoint = Endpoint::new(Ipv4Addr::UNSPECIFIED, 0);

    pub const fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            addr: SocketAddrV4::new(ip, port),
        }
    }

    /// Create an endpoint from a network-order address and port.
    pub fn from_network(ip: u32, port: u16) -> Self {
        Self::new(Ipv4Addr::from(ntoh32(ip)), ntoh16(port))
    }

    pub fn ip(&self) -> Ipv4Addr {
        *self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The address in network byte order, i.e. its in-memory bytes are the
    /// four octets of the address.
    pub fn network_ip(&self) -> u32 {
        hton32(u32::from(self.ip()))
    }

    pub fn network_port(&self) -> u16 {
        hton16(self.port())
    }

    pub fn is_unspecified(&self) -> bool {
        self.ip().is_unspecified()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(self.addr)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self { addr }
    }
}

impl TryFrom<SocketAddr> for Endpoint {
    type Error = SocketError;

    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(addr) => Ok(Self { addr }),
            SocketAddr::V6(_) => Err(SocketError::UnsupportedFamily),
        }
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.socket_addr()
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr)
    }
}
