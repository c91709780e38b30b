/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::cell::{Cell, RefCell};
use std::io::Result as IoResult;
use std::rc::Rc;
use std::sync::Arc;

use mio::event::{Event, Source};
use mio::{Events, Interest, Poll, Registry, Token, Waker};

use log::warn;

use crate::utilities::{exhausted, Deadline, Flag};
use crate::{Canceller, SocketError};

const WAKER: Token = Token(usize::MAX);

thread_local! {
    static INSTANCE: RefCell<Option<Rc<SocketManager>>> = RefCell::new(None);
}

/// The kind of readiness a socket is waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Readable,
    Writable,
}

impl Readiness {
    /// Errors and hang-ups count as ready, so that the next I/O call on the
    /// socket reports them.
    fn matches(self, event: &Event) -> bool {
        event.is_error() || match self {
            Readiness::Readable => event.is_readable() || event.is_read_closed(),
            Readiness::Writable => event.is_writable() || event.is_write_closed(),
        }
    }
}

/// The readiness-wait primitive of a thread, shared by
/// [`nbsock_rs::Listener`](crate::Listener) and
/// [`nbsock_rs::Stream`](crate::Stream)
///
/// The non-blocking operations never wait. Once one of them has reported
/// "would block", the synchronous wrappers hand the socket's token to the
/// manager, which sleeps in its `mio` poll until the socket is ready, the
/// deadline passes, or the manager's [`Canceller`](crate::Canceller) fires.
///
/// A manager can **not** be shared across the thread boundary: each thread
/// needs its own, and [`instance()`](SocketManager::instance()) provides a
/// *thread-local* singleton. Events for sockets other than the awaited one
/// are dropped; this is fine because every wrapper retries its operation
/// before it waits again.
#[derive(Debug)]
pub struct SocketManager {
    poll: RefCell<Poll>,
    events: RefCell<Events>,
    registry: Registry,
    next_token: Cell<usize>,
    cancelled: Arc<Flag>,
}

impl SocketManager {
    pub fn instance() -> IoResult<Rc<Self>> {
        INSTANCE.with(|slot| {
            let mut slot = slot.borrow_mut();
            match slot.as_ref() {
                Some(existing) => Ok(existing.clone()),
                None => Ok(slot.insert(Self::new()?).clone()),
            }
        })
    }

    pub fn new() -> IoResult<Rc<Self>> {
        Self::with_capacity(128)
    }

    /// Create a new manager whose poll can report up to `capacity` events at
    /// once.
    pub fn with_capacity(capacity: usize) -> IoResult<Rc<Self>> {
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        let waker = Waker::new(&registry, WAKER)?;
        Ok(Rc::new(Self {
            poll: RefCell::new(poll),
            events: RefCell::new(Events::with_capacity(capacity.max(1))),
            registry,
            next_token: Cell::new(0),
            cancelled: Arc::new(Flag::new(Some(waker))),
        }))
    }

    pub fn canceller(&self) -> Canceller {
        Canceller::from(self.cancelled.clone())
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.check()
    }

    /// Clear a previous cancellation, so that new operations can be started.
    pub fn restart(&self) -> IoResult<bool> {
        self.cancelled.clear()
    }

    fn next_token(&self) -> Token {
        let token = self.next_token.get();
        self.next_token.set(if token + 1 == WAKER.0 { 0 } else { token + 1 });
        Token(token)
    }

    pub(crate) fn register<S>(&self, source: &mut S, interest: Interest) -> IoResult<Token>
    where
        S: Source + ?Sized,
    {
        let token = self.next_token();
        self.registry.register(source, token, interest)?;
        Ok(token)
    }

    pub(crate) fn deregister<S>(&self, source: &mut S)
    where
        S: Source + ?Sized,
    {
        if let Err(error) = self.registry.deregister(source) {
            warn!("Failed to de-register: {:?}", error);
        }
    }

    /// Sleep until the socket registered as `token` reports `readiness`.
    ///
    /// Fails with [`SocketError::Cancelled`] as soon as the manager has been
    /// cancelled, and with [`SocketError::TimedOut`] once `deadline` passed.
    /// Must only be called after the socket reported "would block", since
    /// readiness is edge-triggered.
    pub(crate) fn wait_for(&self, token: Token, readiness: Readiness, deadline: &Deadline) -> Result<(), SocketError> {
        let mut poll = self.poll.borrow_mut();
        let mut events = self.events.borrow_mut();

        loop {
            if self.cancelled() {
                return Err(SocketError::Cancelled);
            }
            let remaining = deadline.remaining();
            poll.poll(&mut events, remaining)?;
            if events.iter().any(|event| event.token() == token && readiness.matches(event)) {
                return Ok(());
            }
            if exhausted(remaining) {
                return Err(if self.cancelled() { SocketError::Cancelled } else { SocketError::TimedOut });
            }
        }
    }
}
