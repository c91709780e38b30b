/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */

//! Non-blocking accumulation loops.
//!
//! [`recv_until_block()`] drains a non-blocking socket into a freshly grown
//! buffer until the socket would block, is closed by the peer, or fails.
//! [`send_until_block()`] pushes a caller-owned buffer into a non-blocking
//! socket until everything was sent or the socket would block.
//! [`send_all_spin()`] is the busy-retry variant that does not return before
//! the whole buffer was sent.
//!
//! The socket is represented by any [`Read`](std::io::Read) or
//! [`Write`](std::io::Write) implementation, e.g. a `socket2::Socket` or a
//! `mio::net::TcpStream` that was switched to non-blocking mode. The loops
//! never close the socket.

use std::hint;
use std::io::{Read, Write, ErrorKind, Error as IoError};
use std::num::NonZeroUsize;

use log::{debug, error};

use crate::buffer::{GrowableBuffer, ENLARGE_STEP};
use crate::{Canceller, SocketError};

/// Options for [`recv_until_block()`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvOptions {
    /// Growth increment of the receive buffer.
    pub increment: NonZeroUsize,
    /// Upper bound of the receive buffer; exceeding it counts as an
    /// allocation failure.
    pub limit: Option<NonZeroUsize>,
}

impl Default for RecvOptions {
    fn default() -> Self {
        Self {
            increment: NonZeroUsize::new(ENLARGE_STEP).expect("Increment must be non-zero!"),
            limit: None,
        }
    }
}

/// The condition that terminated a [`recv_until_block()`] call
#[derive(Debug)]
pub enum RecvEnd {
    /// No more data is currently available. This is the *expected* outcome.
    WouldBlock,
    /// The peer performed an orderly shutdown.
    Closed,
    /// The cancellation token was raised.
    Cancelled,
    /// The receive buffer could not be grown; accumulated data was discarded.
    OutOfMemory,
    /// The socket reported an unrecoverable error.
    Failed(IoError),
}

/// The result of a [`recv_until_block()`] call
///
/// The data, if any, is owned by the caller now. No buffer is handed out if
/// nothing was received.
#[derive(Debug)]
pub struct Received {
    data: Option<Vec<u8>>,
    end: RecvEnd,
}

impl Received {
    /// Total number of bytes accumulated by the call.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn end(&self) -> &RecvEnd {
        &self.end
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.end, RecvEnd::Closed)
    }

    pub fn into_data(self) -> Option<Vec<u8>> {
        self.data
    }

    pub fn into_parts(self) -> (Option<Vec<u8>>, RecvEnd) {
        (self.data, self.end)
    }
}

/// Receive from a non-blocking socket until it would block.
///
/// The buffer is grown by `options.increment` whenever it is full, and each
/// read requests the remaining spare room. The loop stops when the socket
/// would block, the peer has closed the connection, the socket fails, the
/// `cancel` token is raised, or the buffer can not be grown. Data received up
/// to that point is returned in all cases except the last one.
pub fn recv_until_block<R>(source: &mut R, options: &RecvOptions, cancel: Option<&Canceller>) -> Received
where
    R: Read + ?Sized,
{
    let mut buffer = GrowableBuffer::new(options.increment, options.limit);

    let end = loop {
        if let Err(error) = buffer.ensure_capacity() {
            error!("Failed to grow receive buffer beyond {} bytes: {}", buffer.capacity(), error);
            break RecvEnd::OutOfMemory;
        }
        if cancel.map(Canceller::cancelled).unwrap_or(false) {
            break RecvEnd::Cancelled;
        }
        match source.read(buffer.spare_mut()) {
            Ok(0) => break RecvEnd::Closed,
            Ok(count) => buffer.commit(count),
            Err(error) => match error.kind() {
                ErrorKind::Interrupted => (),
                ErrorKind::WouldBlock => break RecvEnd::WouldBlock,
                _ => {
                    error!("Socket recv failed: {}", error);
                    break RecvEnd::Failed(error);
                },
            },
        }
    };

    debug!("Socket recv total: {} bytes ({:?})", buffer.len(), end);

    let data = match end {
        RecvEnd::OutOfMemory => None,
        _ if buffer.is_empty() => None,
        _ => Some(buffer.into_vec()),
    };

    Received { data, end }
}

/// Send to a non-blocking socket until everything was sent or it would block.
///
/// Returns the number of bytes sent, which is *less* than `data.len()` if the
/// socket would block. The caller is expected to resubmit the remainder once
/// the socket becomes writable again. Any other failure is reported as an
/// error, distinct from a partial send. An empty `data` is rejected with
/// [`SocketError::InvalidArgument`].
pub fn send_until_block<W>(sink: &mut W, data: &[u8]) -> Result<usize, SocketError>
where
    W: Write + ?Sized,
{
    if data.is_empty() {
        return Err(SocketError::InvalidArgument);
    }

    let mut sent = 0;
    while sent < data.len() {
        match sink.write(&data[sent..]) {
            Ok(0) => return Err(write_zero()),
            Ok(count) => sent += count,
            Err(error) => match error.kind() {
                ErrorKind::Interrupted => (),
                ErrorKind::WouldBlock => break,
                _ => {
                    error!("Socket send failed: {}", error);
                    return Err(error.into());
                },
            },
        }
    }

    Ok(sent)
}

/// Send the whole buffer, immediately retrying whenever the socket would block.
///
/// This does **not** return before all bytes were sent or an error occurred,
/// spinning the calling thread while the socket is not writable. It must
/// **not** be used on a thread that drives an event loop, as it would starve
/// all other work; use [`Stream::send_all()`](crate::Stream::send_all())
/// there, which waits for writability instead. The optional `cancel` token is
/// checked on each retry.
pub fn send_all_spin<W>(sink: &mut W, data: &[u8], cancel: Option<&Canceller>) -> Result<(), SocketError>
where
    W: Write + ?Sized,
{
    if data.is_empty() {
        return Err(SocketError::InvalidArgument);
    }

    let mut remaining = data;
    while !remaining.is_empty() {
        if cancel.map(Canceller::cancelled).unwrap_or(false) {
            return Err(SocketError::Cancelled);
        }
        match sink.write(remaining) {
            Ok(0) => return Err(write_zero()),
            Ok(count) => remaining = &remaining[count..],
            Err(error) => match error.kind() {
                ErrorKind::Interrupted => (),
                ErrorKind::WouldBlock => hint::spin_loop(),
                _ => {
                    error!("Socket send failed: {}", error);
                    return Err(error.into());
                },
            },
        }
    }

    Ok(())
}

fn write_zero() -> SocketError {
    error!("Socket send failed: no bytes were accepted!");
    SocketError::Failed(IoError::new(ErrorKind::WriteZero, "socket accepted zero bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Result as IoResult;

    enum Step {
        Data(Vec<u8>),
        Accept(usize),
        Block,
        Interrupt,
        Eof,
        Fail(ErrorKind),
    }

    /// A scripted transport: each call to `read()`/`write()` consumes one step.
    /// Once the script is exhausted the transport would block forever.
    struct Script {
        steps: VecDeque<Step>,
        written: Vec<u8>,
        calls: usize,
    }

    impl Script {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                written: Vec::new(),
                calls: 0,
            }
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
            self.calls += 1;
            match self.steps.pop_front() {
                Some(Step::Data(mut data)) => {
                    let count = data.len().min(buf.len());
                    buf[..count].copy_from_slice(&data[..count]);
                    if count < data.len() {
                        self.steps.push_front(Step::Data(data.split_off(count)));
                    }
                    Ok(count)
                },
                Some(Step::Eof) => Ok(0),
                Some(Step::Interrupt) => Err(ErrorKind::Interrupted.into()),
                Some(Step::Fail(kind)) => Err(kind.into()),
                Some(Step::Accept(_)) => panic!("unexpected write step"),
                Some(Step::Block) | None => Err(ErrorKind::WouldBlock.into()),
            }
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
            self.calls += 1;
            match self.steps.pop_front() {
                Some(Step::Accept(limit)) => {
                    let count = limit.min(buf.len());
                    self.written.extend_from_slice(&buf[..count]);
                    Ok(count)
                },
                Some(Step::Interrupt) => Err(ErrorKind::Interrupted.into()),
                Some(Step::Fail(kind)) => Err(kind.into()),
                Some(Step::Data(_)) | Some(Step::Eof) => panic!("unexpected read step"),
                Some(Step::Block) | None => Err(ErrorKind::WouldBlock.into()),
            }
        }

        fn flush(&mut self) -> IoResult<()> {
            Ok(())
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|n| (n % 251) as u8).collect()
    }

    #[test]
    fn recv_accumulates_until_would_block() {
        let chunks = [pattern(700), pattern(1500), pattern(3)];
        let mut script = Script::new(chunks.iter().cloned().map(Step::Data).chain([Step::Block]).collect());

        let received = recv_until_block(&mut script, &RecvOptions::default(), None);

        let expected: Vec<u8> = chunks.concat();
        assert_eq!(received.len(), expected.len());
        assert!(matches!(received.end(), RecvEnd::WouldBlock));
        assert_eq!(received.into_data().unwrap(), expected);
    }

    #[test]
    fn recv_nothing_available_hands_out_no_buffer() {
        let mut script = Script::new(vec![Step::Block]);
        let received = recv_until_block(&mut script, &RecvOptions::default(), None);
        assert_eq!(received.len(), 0);
        assert!(received.is_empty());
        assert!(received.into_data().is_none());
    }

    #[test]
    fn recv_peer_close_keeps_data() {
        let mut script = Script::new(vec![Step::Data(b"hello".to_vec()), Step::Eof]);
        let received = recv_until_block(&mut script, &RecvOptions::default(), None);
        assert!(received.is_closed());
        assert_eq!(received.data(), Some(&b"hello"[..]));
    }

    #[test]
    fn recv_peer_close_without_data() {
        let mut script = Script::new(vec![Step::Eof]);
        let received = recv_until_block(&mut script, &RecvOptions::default(), None);
        assert!(received.is_closed());
        assert!(received.is_empty());
    }

    #[test]
    fn recv_error_keeps_partial_data() {
        let mut script = Script::new(vec![Step::Data(b"partial".to_vec()), Step::Fail(ErrorKind::ConnectionReset)]);
        let (data, end) = recv_until_block(&mut script, &RecvOptions::default(), None).into_parts();
        assert_eq!(data.unwrap(), b"partial");
        assert!(matches!(end, RecvEnd::Failed(error) if error.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn recv_retries_when_interrupted() {
        let mut script = Script::new(vec![Step::Interrupt, Step::Data(b"abc".to_vec()), Step::Interrupt, Step::Data(b"def".to_vec())]);
        let received = recv_until_block(&mut script, &RecvOptions::default(), None);
        assert!(matches!(received.end(), RecvEnd::WouldBlock));
        assert_eq!(received.data(), Some(&b"abcdef"[..]));
    }

    #[test]
    fn recv_requests_spare_room_only() {
        let options = RecvOptions { increment: NonZeroUsize::new(4).unwrap(), limit: None };
        let mut script = Script::new(vec![Step::Data(b"0123456789".to_vec())]);
        let received = recv_until_block(&mut script, &options, None);
        assert_eq!(received.data(), Some(&b"0123456789"[..]));
        /* 4 + 4 + 2 bytes, then the final would-block */
        assert_eq!(script.calls, 4);
    }

    #[test]
    fn recv_growth_failure_discards_data() {
        let options = RecvOptions { increment: NonZeroUsize::new(4).unwrap(), limit: NonZeroUsize::new(8) };
        let mut script = Script::new(vec![Step::Data(pattern(32))]);
        let received = recv_until_block(&mut script, &options, None);
        assert!(matches!(received.end(), RecvEnd::OutOfMemory));
        assert!(received.is_empty());
    }

    #[test]
    fn recv_stops_when_cancelled() {
        let canceller = Canceller::new();
        canceller.cancel().unwrap();
        let mut script = Script::new(vec![Step::Data(b"never read".to_vec())]);
        let received = recv_until_block(&mut script, &RecvOptions::default(), Some(&canceller));
        assert!(matches!(received.end(), RecvEnd::Cancelled));
        assert!(received.is_empty());
        assert_eq!(script.calls, 0);
    }

    /// Delivers its chunks one per `read()`, raising the token while handing
    /// out the first one.
    struct CancelledWhileReading {
        chunks: VecDeque<Vec<u8>>,
        canceller: Canceller,
        calls: usize,
    }

    impl Read for CancelledWhileReading {
        fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
            self.calls += 1;
            self.canceller.cancel()?;
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                },
                None => Err(ErrorKind::WouldBlock.into()),
            }
        }
    }

    #[test]
    fn recv_cancelled_midway_keeps_data() {
        let canceller = Canceller::new();
        let mut source = CancelledWhileReading {
            chunks: vec![b"first".to_vec(), b"second".to_vec()].into(),
            canceller: canceller.clone(),
            calls: 0,
        };
        let received = recv_until_block(&mut source, &RecvOptions::default(), Some(&canceller));
        assert!(matches!(received.end(), RecvEnd::Cancelled));
        assert_eq!(received.data(), Some(&b"first"[..]));
        assert_eq!(source.calls, 1);
        assert_eq!(source.chunks.len(), 1);
    }

    #[test]
    fn send_everything_without_blocking() {
        let data = pattern(5000);
        let mut script = Script::new(vec![Step::Accept(1000), Step::Accept(3000), Step::Accept(usize::MAX)]);
        assert_eq!(send_until_block(&mut script, &data).unwrap(), data.len());
        assert_eq!(script.written, data);
    }

    #[test]
    fn send_partial_on_would_block() {
        let data = pattern(5000);
        let mut script = Script::new(vec![Step::Accept(1200), Step::Interrupt, Step::Accept(800), Step::Block, Step::Accept(usize::MAX)]);
        assert_eq!(send_until_block(&mut script, &data).unwrap(), 2000);
        assert_eq!(script.written, &data[..2000]);

        /* resubmit the remainder later */
        assert_eq!(send_until_block(&mut script, &data[2000..]).unwrap(), 3000);
        assert_eq!(script.written, data);
    }

    #[test]
    fn send_would_block_immediately_returns_zero() {
        let mut script = Script::new(vec![Step::Block]);
        assert_eq!(send_until_block(&mut script, b"data").unwrap(), 0);
    }

    #[test]
    fn send_failure_is_distinct_from_partial() {
        let mut script = Script::new(vec![Step::Accept(2), Step::Fail(ErrorKind::BrokenPipe)]);
        match send_until_block(&mut script, b"abcdef") {
            Err(SocketError::Failed(error)) => assert_eq!(error.kind(), ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn send_rejects_empty_buffer() {
        let mut script = Script::new(vec![]);
        assert!(matches!(send_until_block(&mut script, &[]), Err(SocketError::InvalidArgument)));
        assert!(matches!(send_all_spin(&mut script, &[], None), Err(SocketError::InvalidArgument)));
        assert_eq!(script.calls, 0);
    }

    #[test]
    fn send_zero_accepted_is_failure() {
        let mut script = Script::new(vec![Step::Accept(0)]);
        assert!(matches!(send_until_block(&mut script, b"x"), Err(SocketError::Failed(error)) if error.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn send_all_retries_through_would_block() {
        let data = pattern(4096);
        let mut script = Script::new(vec![Step::Block, Step::Accept(100), Step::Block, Step::Block, Step::Interrupt, Step::Accept(2000), Step::Block, Step::Accept(usize::MAX)]);
        send_all_spin(&mut script, &data, None).unwrap();
        assert_eq!(script.written, data);
    }

    #[test]
    fn send_all_reports_failure() {
        let mut script = Script::new(vec![Step::Accept(1), Step::Block, Step::Fail(ErrorKind::ConnectionReset), Step::Accept(usize::MAX)]);
        assert!(matches!(send_all_spin(&mut script, b"abc", None), Err(SocketError::Failed(_))));
        assert_eq!(script.written, b"a");
    }

    #[test]
    fn send_all_honours_cancellation() {
        let canceller = Canceller::new();
        canceller.cancel().unwrap();
        let mut script = Script::new(vec![Step::Accept(usize::MAX)]);
        assert!(matches!(send_all_spin(&mut script, b"abc", Some(&canceller)), Err(SocketError::Cancelled)));
        assert!(script.written.is_empty());
    }
}
