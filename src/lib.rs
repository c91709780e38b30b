/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */

//! **nbsock** is a thin socket adaptation layer around non-blocking IPv4 TCP
//! and UDP sockets.
//!
//! Its core are two *accumulation loops*:
//!
//! * [`recv_until_block()`] drains a non-blocking socket into a buffer that
//!   grows in fixed increments, until the socket "would block", the peer
//!   closes the connection, or an error occurs. Everything received so far is
//!   handed to the caller, so a single "readable" notification is amortized
//!   over all data currently queued in the kernel.
//! * [`send_until_block()`] pushes a caller-owned buffer into a non-blocking
//!   socket until the socket "would block", reporting how much was sent so the
//!   remainder can be resubmitted later. [`send_all_spin()`] is the busy-retry
//!   variant that only returns once *everything* was sent.
//!
//! Both loops work on any [`std::io::Read`]/[`std::io::Write`]
//! implementation, e.g. a [`socket2::Socket`] or a [`mio::net::TcpStream`].
//!
//! Around that core, the crate provides:
//!
//! * syscall pass-throughs in the [`socket`] module (create, bind, connect,
//!   listen, accept, send, recv, recvfrom, writev, socket options),
//! * endpoint resolution via [`resolve()`], yielding exactly one IPv4
//!   [`Endpoint`],
//! * host/network byte-order conversion for 16, 32 and 64-bit values in the
//!   [`byteorder`] module,
//! * a readiness-wait layer ([`SocketManager`], [`Listener`], [`Stream`])
//!   built on [**`mio`**](mio), whose [`Stream::send_all()`] *waits* for
//!   writability instead of spinning, and an explicit [`Canceller`] token
//!   that aborts pending waits and loops from any thread.
//!
//! The library only emits log records via the [`log`] facade; installing a
//! logger is up to the application.

mod buffer;
mod canceller;
mod connection;
mod endpoint;
mod error;
mod listener;
mod manager;
mod resolve;
mod stream;
mod transfer;
mod utilities;

pub mod byteorder;
pub mod socket;

pub use buffer::{GrowableBuffer, ENLARGE_STEP};
pub use canceller::Canceller;
pub use connection::Connection;
pub use endpoint::Endpoint;
pub use error::SocketError;
pub use listener::Listener;
pub use manager::SocketManager;
pub use resolve::{resolve, Protocol};
pub use stream::Stream;
pub use transfer::{recv_until_block, send_all_spin, send_until_block, Received, RecvEnd, RecvOptions};
