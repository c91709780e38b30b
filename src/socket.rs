/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */

//! Thin pass-throughs to the socket syscalls, restricted to IPv4.
//!
//! Addresses are exchanged as [`Endpoint`] values; any address of another
//! family reported by the operating system is rejected with
//! [`SocketError::UnsupportedFamily`].

use std::io::{IoSlice, Read, Result as IoResult};
use std::mem::MaybeUninit;

use log::error;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::{Endpoint, SocketError};

fn create(ty: Type, protocol: Protocol) -> IoResult<Socket> {
    Socket::new(Domain::IPV4, ty, Some(protocol)).map_err(|error| {
        error!("Failed to create socket: {}", error);
        error
    })
}

pub fn tcp_create() -> IoResult<Socket> {
    create(Type::STREAM, Protocol::TCP)
}

pub fn udp_create() -> IoResult<Socket> {
    create(Type::DGRAM, Protocol::UDP)
}

pub fn set_nonblocking(socket: &Socket) -> IoResult<()> {
    socket.set_nonblocking(true).map_err(|error| {
        error!("Failed to switch socket to non-blocking mode: {}", error);
        error
    })
}

/// Enable `SO_REUSEADDR`.
pub fn set_reuse_address(socket: &Socket) -> IoResult<()> {
    socket.set_reuse_address(true)
}

pub fn reuse_address(socket: &Socket) -> IoResult<bool> {
    socket.reuse_address()
}

/// Take the pending error of the socket (`SO_ERROR`), if any.
pub fn socket_error(socket: &Socket) -> IoResult<Option<std::io::Error>> {
    socket.take_error()
}

/// Bind to `endpoint`; an unspecified address binds to all interfaces.
pub fn bind(socket: &Socket, endpoint: Endpoint) -> IoResult<()> {
    socket.bind(&SockAddr::from(endpoint.socket_addr()))
}

pub fn connect(socket: &Socket, endpoint: Endpoint) -> IoResult<()> {
    socket.connect(&SockAddr::from(endpoint.socket_addr()))
}

pub fn listen(socket: &Socket, backlog: i32) -> IoResult<()> {
    socket.listen(backlog)
}

pub fn accept(socket: &Socket) -> Result<(Socket, Endpoint), SocketError> {
    let (client, addr) = socket.accept()?;
    Ok((client, to_endpoint(&addr)?))
}

pub fn local_endpoint(socket: &Socket) -> Result<Endpoint, SocketError> {
    to_endpoint(&socket.local_addr()?)
}

pub fn peer_endpoint(socket: &Socket) -> Result<Endpoint, SocketError> {
    to_endpoint(&socket.peer_addr()?)
}

pub fn send(socket: &Socket, buffer: &[u8]) -> IoResult<usize> {
    socket.send(buffer)
}

pub fn recv(socket: &Socket, buffer: &mut [u8]) -> IoResult<usize> {
    let mut socket = socket;
    socket.read(buffer)
}

/// Receive a single datagram, returning its length and the sender.
pub fn udp_recv_from(socket: &Socket, buffer: &mut [u8]) -> Result<(usize, Endpoint), SocketError> {
    // SAFETY: `recv_from()` never writes uninitialized bytes into the buffer.
    let uninit = unsafe { &mut *(buffer as *mut [u8] as *mut [MaybeUninit<u8>]) };
    let (count, addr) = socket.recv_from(uninit)?;
    Ok((count, to_endpoint(&addr)?))
}

/// Send several buffers with a single call (`writev`).
pub fn send_vectored(socket: &Socket, buffers: &[IoSlice<'_>]) -> IoResult<usize> {
    socket.send_vectored(buffers)
}

fn to_endpoint(addr: &SockAddr) -> Result<Endpoint, SocketError> {
    addr.as_socket_ipv4().map(Endpoint::from).ok_or(SocketError::UnsupportedFamily)
}
