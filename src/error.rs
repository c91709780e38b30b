/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::error::Error;
use std::fmt::{Display, Debug, Formatter};
use std::io::{ErrorKind, Error as IoError};

/// The error type for **nbsock** operations
///
/// Note that *"would block"* is **not** an error in this crate: the
/// non-blocking loops treat it as a normal pause condition and report how much
/// data was transferred up to that point.
///
/// Errors from the operating system (or the `mio`/`socket2` layer) are passed
/// through "as-is" in the [`Failed`](SocketError::Failed) variant.
pub enum SocketError {
    /// Indicates that the operation was *cancelled* via a
    /// [`nbsock_rs::Canceller`](crate::Canceller). Data may have been read or
    /// written partially!
    Cancelled,
    /// Indicates that the operation encountered a time-out. Data may have been
    /// read or written partially!
    TimedOut,
    /// Indicates that the operation finished (usually because the stream was
    /// closed) before all data could be transferred.
    Incomplete,
    /// Indicates that a receive buffer could not be grown, either because the
    /// allocation failed or because the configured limit was reached.
    OutOfMemory,
    /// Indicates that an operation was invoked with an unusable argument,
    /// e.g. an empty send buffer.
    InvalidArgument,
    /// Indicates that an address of a family other than IPv4 was encountered.
    UnsupportedFamily,
    /// Indicates that a host/service pair could not be resolved. The `message`
    /// contains the resolver's own diagnostic text.
    Resolve {
        host: String,
        service: String,
        message: String,
    },
    /// Indicates that the operation failed because of an I/O error. The inner
    /// [`std::io::Error`](std::io::Error) is provided.
    Failed(IoError),
}

impl SocketError {
    /// The [`ErrorKind`](std::io::ErrorKind) this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Interrupted,
            Self::TimedOut => ErrorKind::TimedOut,
            Self::Incomplete => ErrorKind::UnexpectedEof,
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::InvalidArgument => ErrorKind::InvalidInput,
            Self::UnsupportedFamily => ErrorKind::Unsupported,
            Self::Resolve { .. } => ErrorKind::NotFound,
            Self::Failed(inner) => inner.kind(),
        }
    }
}

impl Debug for SocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "SocketError::Cancelled"),
            Self::TimedOut => write!(f, "SocketError::TimedOut"),
            Self::Incomplete => write!(f, "SocketError::Incomplete"),
            Self::OutOfMemory => write!(f, "SocketError::OutOfMemory"),
            Self::InvalidArgument => write!(f, "SocketError::InvalidArgument"),
            Self::UnsupportedFamily => write!(f, "SocketError::UnsupportedFamily"),
            Self::Resolve { host, service, message } => write!(f, "SocketError::Resolve({}:{}, {:?})", host, service, message),
            Self::Failed(error) => write!(f, "SocketError::Failed({:?})", error),
        }
    }
}

impl Display for SocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "The socket operation was cancelled!"),
            Self::TimedOut => write!(f, "The socket operation timed out!"),
            Self::Incomplete => write!(f, "The socket operation is incomplete!"),
            Self::OutOfMemory => write!(f, "The receive buffer could not be grown!"),
            Self::InvalidArgument => write!(f, "The socket operation was invoked with an invalid argument!"),
            Self::UnsupportedFamily => write!(f, "The address is not an IPv4 address!"),
            Self::Resolve { host, service, message } => write!(f, "Failed to resolve {}:{}: {}", host, service, message),
            Self::Failed(error) => write!(f, "{}", error),
        }
    }
}

impl Error for SocketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for SocketError {
    fn from(error: IoError) -> Self {
        Self::Failed(error)
    }
}

impl From<SocketError> for IoError {
    fn from(error: SocketError) -> Self {
        match error {
            SocketError::Failed(inner) => inner,
            other => IoError::new(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_is_passed_through() {
        let error: SocketError = IoError::new(ErrorKind::ConnectionReset, "reset").into();
        assert_eq!(error.kind(), ErrorKind::ConnectionReset);
        let io_error: IoError = error.into();
        assert_eq!(io_error.kind(), ErrorKind::ConnectionReset);
        assert!(io_error.get_ref().is_some());
    }

    #[test]
    fn crate_error_is_wrapped_as_inner() {
        let io_error: IoError = SocketError::TimedOut.into();
        assert_eq!(io_error.kind(), ErrorKind::TimedOut);
        let inner = io_error.get_ref().and_then(|inner| inner.downcast_ref::<SocketError>());
        assert!(matches!(inner, Some(SocketError::TimedOut)));
    }

    #[test]
    fn resolve_error_carries_diagnostic() {
        let error = SocketError::Resolve {
            host: "foo.invalid".to_owned(),
            service: "80".to_owned(),
            message: "Name or service not known".to_owned(),
        };
        assert_eq!(error.to_string(), "Failed to resolve foo.invalid:80: Name or service not known");
    }
}
