/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::Result as IoResult;
use std::net::Shutdown;

use mio::net::TcpStream as MioTcpStream;

use crate::Endpoint;

/// An accepted, non-blocking TCP connection, usually used to initialize a new
/// [`nbsock_rs::Stream`](crate::Stream)
///
/// Unlike a `nbsock_rs::Stream`, the `nbsock_rs::Connection` is **not** yet
/// tied to a [`nbsock_rs::SocketManager`](crate::SocketManager) and can
/// therefore be moved across the thread boundary, e.g. to a worker thread.
#[derive(Debug)]
pub struct Connection {
    stream: MioTcpStream,
    peer: Endpoint,
}

impl Connection {
    pub(crate) fn new(stream: MioTcpStream, peer: Endpoint) -> Self {
        Self {
            stream,
            peer,
        }
    }

    pub(crate) fn into_parts(self) -> (MioTcpStream, Endpoint) {
        (self.stream, self.peer)
    }

    /// The remote endpoint, as reported when the connection was accepted.
    pub fn peer(&self) -> Endpoint {
        self.peer
    }

    pub fn local(&self) -> Option<Endpoint> {
        self.stream.local_addr().ok().and_then(|addr| Endpoint::try_from(addr).ok())
    }

    /// Shuts down the read, write, or both halves of this connection.
    pub fn shutdown(&self, how: Shutdown) -> IoResult<()> {
        self.stream.shutdown(how)
    }
}
