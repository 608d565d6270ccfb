//! Server error types, split by blast radius: bootstrap errors are fatal to
//! the process, channel errors are fatal to a single connection.

use std::fmt;

use waypoint_crypto::CryptoError;

/// Errors that can prevent the server from starting at all.
///
/// Every variant here is logged at `error` and followed by a non-zero
/// process exit; there is no recovery path.
#[derive(Debug)]
pub enum BootstrapError {
    /// The config file exists but could not be parsed as JSON.
    Config(String),

    /// The storage root could not be created or is not writable.
    Storage(String),

    /// The TCP listener could not be bound.
    Listen(String),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::Listen(msg) => write!(f, "listen error: {msg}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

/// Errors that close a single connection without affecting the process or
/// other connections.
///
/// Request-scoped failures (bad headers, missing files) are a separate tier
/// — see `waypoint_core::DispatchError` — and do not produce a
/// `ChannelError`; they produce `ERR` and the connection stays open.
#[derive(Debug)]
pub enum ChannelError {
    /// Handshake failed: bad request id, parse failure, or key-wrap failure.
    Handshake(String),

    /// A framed packet declared a length over the 65536-byte cap.
    FrameTooLarge {
        /// The declared length.
        got: usize,
        /// The maximum allowed length.
        max: usize,
    },

    /// The underlying AEAD cipher rejected a frame.
    Crypto(CryptoError),

    /// A socket read or write failed, including a deadline timeout.
    Io(std::io::Error),

    /// The peer closed the connection cleanly.
    Closed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake(msg) => write!(f, "handshake failed: {msg}"),
            Self::FrameTooLarge { got, max } => {
                write!(f, "frame of {got} bytes exceeds the {max}-byte cap")
            },
            Self::Crypto(err) => write!(f, "channel crypto error: {err}"),
            Self::Io(err) => write!(f, "channel I/O error: {err}"),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Crypto(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CryptoError> for ChannelError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err)
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Closed
        } else {
            Self::Io(err)
        }
    }
}

impl From<tokio::time::error::Elapsed> for ChannelError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed"))
    }
}
