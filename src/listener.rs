/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::ErrorKind;
use std::rc::Rc;
use std::time::Duration;

use mio::{Token, Interest};
use mio::net::TcpListener as MioTcpListener;

use log::debug;

use crate::manager::Readiness;
use crate::utilities::Deadline;
use crate::{socket, Connection, Endpoint, SocketError, SocketManager};

/// A listening IPv4 TCP socket with ***timeout*** and ***cancellation***
/// support on [`accept()`](Listener::accept())
///
/// The socket is created with `SO_REUSEADDR` and is non-blocking; waiting for
/// incoming connections goes through the poll of the
/// [`nbsock_rs::SocketManager`](crate::SocketManager) it is tied to.
#[derive(Debug)]
pub struct Listener {
    listener: MioTcpListener,
    token: Token,
    manager: Rc<SocketManager>,
}

impl Listener {
    pub fn bind(manager: &Rc<SocketManager>, endpoint: Endpoint, backlog: i32) -> Result<Self, SocketError> {
        let manager = manager.clone();
        let (listener, token) = Self::initialize(&manager, endpoint, backlog)?;

        Ok(Self {
            listener,
            token,
            manager,
        })
    }

    fn initialize(manager: &SocketManager, endpoint: Endpoint, backlog: i32) -> Result<(MioTcpListener, Token), SocketError> {
        let socket = socket::tcp_create()?;
        socket::set_reuse_address(&socket)?;
        socket::bind(&socket, endpoint)?;
        socket::listen(&socket, backlog)?;
        socket::set_nonblocking(&socket)?;

        let mut listener = MioTcpListener::from_std(socket.into());
        let token = manager.register(&mut listener, Interest::READABLE)?;
        Ok((listener, token))
    }

    pub fn local(&self) -> Result<Endpoint, SocketError> {
        Endpoint::try_from(self.listener.local_addr()?)
    }

    pub fn accept(&self, timeout: Option<Duration>) -> Result<Connection, SocketError> {
        if self.manager.cancelled() {
            return Err(SocketError::Cancelled);
        }

        let deadline = Deadline::after(timeout);

        loop {
            if let Some(connection) = Self::event_accept(&self.listener)? {
                return Ok(connection);
            }
            self.manager.wait_for(self.token, Readiness::Readable, &deadline)?;
        }
    }

    fn event_accept(listener: &MioTcpListener) -> Result<Option<Connection>, SocketError> {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    let peer = Endpoint::try_from(addr)?;
                    debug!("Accepted connection from {}", peer);
                    return Ok(Some(Connection::new(stream, peer)));
                },
                Err(error) => match error.kind() {
                    ErrorKind::Interrupted => (),
                    ErrorKind::WouldBlock => return Ok(None),
                    _ => return Err(error.into()),
                },
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.manager.deregister(&mut self.listener);
    }
}
