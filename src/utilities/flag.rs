/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::io::Result;
use std::sync::atomic::{AtomicBool, Ordering};

use mio::Waker;

/// A cancellation flag, optionally waking up a blocked `mio::Poll` whenever
/// its state changes.
#[derive(Debug)]
pub(crate) struct Flag {
    waker: Option<Waker>,
    flag: AtomicBool,
}

impl Flag {
    pub fn new(waker: Option<Waker>) -> Self {
        Self {
            waker,
            flag: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) -> Result<bool> {
        match self.flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => self.wake(),
            Err(_) => Ok(false)
        }
    }

    pub fn clear(&self) -> Result<bool> {
        match self.flag.compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => self.wake(),
            Err(_) => Ok(false)
        }
    }

    pub fn check(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn wake(&self) -> Result<bool> {
        match &self.waker {
            Some(waker) => waker.wake().map(|_| true),
            None => Ok(true),
        }
    }
}
