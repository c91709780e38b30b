/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::num::NonZeroUsize;

use crate::SocketError;

/// Default growth increment of a [`GrowableBuffer`], in bytes.
pub const ENLARGE_STEP: usize = 1024;

/// A byte buffer that grows in fixed increments, used to accumulate the data
/// of a single receive operation
///
/// The buffer keeps track of its `capacity` (bytes allocated and initialized)
/// and its `length` (bytes written so far). It holds that `length <= capacity`
/// at all times. The capacity grows *only* when the buffer is full, and
/// *only* by the configured increment.
#[derive(Debug)]
pub struct GrowableBuffer {
    buffer: Vec<u8>,
    length: usize,
    increment: usize,
    limit: usize,
}

impl GrowableBuffer {
    /// Create an empty buffer that grows by `increment` bytes at a time and
    /// never beyond `limit` bytes, if given. Nothing is allocated yet.
    pub fn new(increment: NonZeroUsize, limit: Option<NonZeroUsize>) -> Self {
        Self {
            buffer: Vec::new(),
            length: 0,
            increment: increment.get(),
            limit: limit.map_or(usize::MAX, NonZeroUsize::get),
        }
    }

    /// Create an empty, unbounded buffer growing by [`ENLARGE_STEP`] bytes.
    pub fn with_defaults() -> Self {
        Self {
            buffer: Vec::new(),
            length: 0,
            increment: ENLARGE_STEP,
            limit: usize::MAX,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.length]
    }

    /// Grow the buffer by one increment, if (and only if) it is full.
    ///
    /// Returns `Ok(true)` if the buffer was grown and `Ok(false)` if there
    /// still was spare room. Already written bytes are preserved. If the
    /// allocation fails, or the new capacity would exceed the limit, an
    /// [`SocketError::OutOfMemory`] is returned and the buffer must be
    /// considered unusable.
    pub fn ensure_capacity(&mut self) -> Result<bool, SocketError> {
        let capacity = self.capacity();
        if capacity > self.length {
            return Ok(false);
        }

        let new_capacity = match capacity.checked_add(self.increment) {
            Some(value) if value <= self.limit => value,
            _ => return Err(SocketError::OutOfMemory),
        };

        if self.buffer.try_reserve_exact(self.increment).is_err() {
            return Err(SocketError::OutOfMemory);
        }

        self.buffer.resize(new_capacity, 0);
        Ok(true)
    }

    /// The writable region `[length..capacity]`.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.length..]
    }

    /// Mark `additional` bytes of the spare region as written.
    pub fn commit(&mut self, additional: usize) {
        let new_length = self.length.checked_add(additional).expect("Numerical overflow!");
        assert!(new_length <= self.capacity());
        self.length = new_length;
    }

    /// Hand out the written bytes, dropping the unused spare capacity.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buffer.truncate(self.length);
        self.buffer
    }
}
