/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::Error as IoError;

use dns_lookup::{getaddrinfo, AddrInfoHints};
use log::info;
use socket2::{Domain, Type};

use crate::{Endpoint, SocketError};

/// The transport protocol a host/service pair is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    fn socket_type(self) -> Type {
        match self {
            Protocol::Tcp => Type::STREAM,
            Protocol::Udp => Type::DGRAM,
        }
    }
}

/// Resolve a host/service pair to a single IPv4 [`Endpoint`].
///
/// Only the *first* result of the resolver is considered; there is no
/// fallback to further candidates. A result of any family other than IPv4 is
/// rejected with [`SocketError::UnsupportedFamily`]. If the resolver fails,
/// [`SocketError::Resolve`] carries its diagnostic text.
pub fn resolve(host: &str, service: &str, protocol: Protocol) -> Result<Endpoint, SocketError> {
    let hints = AddrInfoHints {
        socktype: protocol.socket_type().into(),
        address: Domain::IPV4.into(),
        ..AddrInfoHints::default()
    };

    info!("Looking up {}:{} ...", host, service);

    let resolve_error = |message: String| {
        info!("Lookup of {}:{} has failed: {}", host, service, message);
        SocketError::Resolve {
            host: host.to_owned(),
            service: service.to_owned(),
            message,
        }
    };

    let first = getaddrinfo(Some(host), Some(service), Some(hints))
        .map_err(|error| resolve_error(IoError::from(error).to_string()))?
        .next();

    match first {
        Some(Ok(info)) => Endpoint::try_from(info.sockaddr),
        Some(Err(error)) => Err(resolve_error(error.to_string())),
        None => Err(resolve_error("no address returned".to_owned())),
    }
}
