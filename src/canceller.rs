/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::Result;
use std::sync::Arc;

use crate::utilities::Flag;

/// An explicit cancellation token for the accumulation loops and for pending
/// readiness waits
///
/// A `nbsock_rs::Canceller` is either *standalone*, created by
/// [`new()`](Canceller::new()) and passed directly to
/// [`recv_until_block()`](crate::recv_until_block()) or
/// [`send_all_spin()`](crate::send_all_spin()), or it is tied to a
/// [`nbsock_rs::SocketManager`](crate::SocketManager) instance, in which case
/// calling [`cancel()`](Canceller::cancel()) also wakes up any
/// [`nbsock_rs::Stream`](crate::Stream) or
/// [`nbsock_rs::Listener`](crate::Listener) that is currently waiting for
/// readiness. Cloned instances share the same state, and instances *can* be
/// moved across the thread boundary, e.g. into a Ctrl+C (SIGINT) handler.
///
/// There is **no** guarantee that an operation already in progress observes
/// the cancellation; the loops check the token once per iteration.
#[derive(Debug, Clone)]
pub struct Canceller {
    flag: Arc<Flag>,
}

impl Canceller {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(Flag::new(None)),
        }
    }

    pub(crate) fn from(flag: Arc<Flag>) -> Self {
        Self {
            flag,
        }
    }

    /// Request cancellation. Returns `true` if the state has changed.
    pub fn cancel(&self) -> Result<bool> {
        self.flag.raise()
    }

    /// Withdraw a previous cancellation request.
    pub fn reset(&self) -> Result<bool> {
        self.flag.clear()
    }

    pub fn cancelled(&self) -> bool {
        self.flag.check()
    }
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}
