/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::{ErrorKind, Result as IoResult};
use std::net::Shutdown;
use std::rc::Rc;
use std::time::Duration;

use mio::{Token, Interest};
use mio::net::TcpStream as MioTcpStream;

use log::debug;

use crate::manager::Readiness;
use crate::transfer::{self, Received, RecvEnd, RecvOptions};
use crate::utilities::Deadline;
use crate::{Canceller, Connection, Endpoint, SocketError, SocketManager};

/// A non-blocking IPv4 TCP stream, tied to a
/// [`nbsock_rs::SocketManager`](crate::SocketManager)
///
/// [`recv_until_block()`](Stream::recv_until_block()) and
/// [`send_until_block()`](Stream::send_until_block()) never wait: they are
/// meant to be called when the caller already knows the socket is ready.
/// [`recv_timeout()`](Stream::recv_timeout()) and
/// [`send_all()`](Stream::send_all()) are the synchronous wrappers on top of
/// them, which *wait* for readiness via the manager's poll whenever the socket
/// would block, instead of spinning.
///
/// If the `timeout` parameter is set to `Some(Duration)` and the operation
/// does **not** complete before the timeout expires, it fails with
/// [`SocketError::TimedOut`](crate::SocketError::TimedOut). Cancelling the
/// manager's [`nbsock_rs::Canceller`](crate::Canceller) makes pending and new
/// operations fail with [`SocketError::Cancelled`](crate::SocketError::Cancelled).
#[derive(Debug)]
pub struct Stream {
    stream: MioTcpStream,
    token: Token,
    peer: Endpoint,
    options: RecvOptions,
    canceller: Canceller,
    manager: Rc<SocketManager>,
}

const INTEREST: Interest = Interest::READABLE.add(Interest::WRITABLE);

impl Stream {
    pub fn from(manager: &Rc<SocketManager>, connection: Connection) -> Result<Self, SocketError> {
        let (mut stream, peer) = connection.into_parts();
        let manager = manager.clone();
        let token = manager.register(&mut stream, INTEREST)?;

        Ok(Self {
            stream,
            token,
            peer,
            options: RecvOptions::default(),
            canceller: manager.canceller(),
            manager,
        })
    }

    pub fn set_recv_options(&mut self, options: RecvOptions) {
        self.options = options;
    }

    pub fn peer(&self) -> Endpoint {
        self.peer
    }

    pub fn local(&self) -> Option<Endpoint> {
        self.stream.local_addr().ok().and_then(|addr| Endpoint::try_from(addr).ok())
    }

    pub fn shutdown(&self, how: Shutdown) -> IoResult<()> {
        self.stream.shutdown(how)
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~
    // Connect functions
    // ~~~~~~~~~~~~~~~~~~~~~~~

    pub fn connect(manager: &Rc<SocketManager>, endpoint: Endpoint, timeout: Option<Duration>) -> Result<Self, SocketError> {
        if manager.cancelled() {
            return Err(SocketError::Cancelled);
        }

        let mut stream = MioTcpStream::connect(endpoint.socket_addr())?;
        let manager = manager.clone();
        let token = Self::init_connection(&manager, &mut stream, timeout)?;

        Ok(Self {
            stream,
            token,
            peer: endpoint,
            options: RecvOptions::default(),
            canceller: manager.canceller(),
            manager,
        })
    }

    fn init_connection(manager: &SocketManager, stream: &mut MioTcpStream, timeout: Option<Duration>) -> Result<Token, SocketError> {
        let token = manager.register(stream, INTEREST)?;
        let deadline = Deadline::after(timeout);

        let connected = loop {
            if let Err(error) = manager.wait_for(token, Readiness::Writable, &deadline) {
                break Err(error);
            }
            match Self::event_conn(stream) {
                Ok(true) => break Ok(token),
                Ok(false) => (),
                Err(error) => break Err(error.into()),
            }
        };

        if connected.is_err() {
            manager.deregister(stream);
        }
        connected
    }

    fn event_conn(stream: &MioTcpStream) -> IoResult<bool> {
        loop {
            if let Some(err) = stream.take_error()? {
                return Err(err);
            }
            match stream.peer_addr() {
                Ok(_addr) => return Ok(true),
                Err(error) => match error.kind() {
                    ErrorKind::Interrupted => (),
                    ErrorKind::NotConnected => return Ok(false),
                    _ => return Err(error),
                },
            }
        }
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~
    // Receive functions
    // ~~~~~~~~~~~~~~~~~~~~~~~

    /// Drain all currently available data, without waiting.
    ///
    /// See [`recv_until_block()`](crate::recv_until_block()); the manager's
    /// canceller is used as the cancellation token.
    pub fn recv_until_block(&mut self) -> Received {
        transfer::recv_until_block(&mut self.stream, &self.options, Some(&self.canceller))
    }

    /// Drain all available data, first waiting until *some* data is available.
    ///
    /// Returns as soon as at least one byte was received or the peer closed
    /// the connection, with everything that could be read without blocking.
    ///
    /// A receive that fails, or that exceeds the
    /// [`RecvOptions`](crate::RecvOptions) limit, is **not** an `Err`: it is
    /// returned as `Ok`, possibly without any data, and its
    /// [`end()`](crate::Received::end()) is
    /// [`RecvEnd::Failed`](crate::RecvEnd::Failed) or
    /// [`RecvEnd::OutOfMemory`](crate::RecvEnd::OutOfMemory). Callers that
    /// loop until [`is_closed()`](crate::Received::is_closed()) must check for
    /// these as well.
    pub fn recv_timeout(&mut self, timeout: Option<Duration>) -> Result<Received, SocketError> {
        if self.manager.cancelled() {
            return Err(SocketError::Cancelled);
        }

        let deadline = Deadline::after(timeout);

        loop {
            let received = self.recv_until_block();
            match received.end() {
                RecvEnd::WouldBlock if received.is_empty() => (),
                RecvEnd::Cancelled if received.is_empty() => return Err(SocketError::Cancelled),
                _ => return Ok(received),
            }
            self.manager.wait_for(self.token, Readiness::Readable, &deadline)?;
        }
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~
    // Send functions
    // ~~~~~~~~~~~~~~~~~~~~~~~

    /// Send as much as possible, without waiting.
    ///
    /// See [`send_until_block()`](crate::send_until_block()).
    pub fn send_until_block(&mut self, data: &[u8]) -> Result<usize, SocketError> {
        transfer::send_until_block(&mut self.stream, data)
    }

    /// Send the whole buffer, waiting for writability whenever the socket
    /// would block.
    ///
    /// Unlike [`send_all_spin()`](crate::send_all_spin()), the calling thread
    /// sleeps in the poll while the socket is not writable.
    pub fn send_all(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<(), SocketError> {
        if self.manager.cancelled() {
            return Err(SocketError::Cancelled);
        }
        if data.is_empty() {
            return Ok(());
        }

        let deadline = Deadline::after(timeout);
        let mut remaining = data;

        loop {
            let sent = self.send_until_block(remaining)?;
            remaining = &remaining[sent..];
            if remaining.is_empty() {
                return Ok(());
            }
            debug!("Send to {} would block, {} bytes pending", self.peer, remaining.len());
            self.manager.wait_for(self.token, Readiness::Writable, &deadline)?;
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.manager.deregister(&mut self.stream);
    }
}
