//! Protocol-level error types.

use thiserror::Error;

/// Errors produced while decoding or validating wire structures.
///
/// These are request-scoped: the caller responds with `ERR` and keeps the
/// connection open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer was shorter than the structure being decoded.
    #[error("buffer too short: need {need} bytes, got {got}")]
    BufferTooShort {
        /// Bytes required.
        need: usize,
        /// Bytes available.
        got: usize,
    },

    /// `start` was not strictly greater than the minimum timestamp.
    #[error("start timestamp {start} is not after the minimum {minimum}")]
    StartTooEarly {
        /// Start timestamp from the header.
        start: u32,
        /// Minimum allowed timestamp (exclusive).
        minimum: u32,
    },

    /// `end` was earlier than `start`.
    #[error("end timestamp {end} is before start timestamp {start}")]
    EndBeforeStart {
        /// Start timestamp from the header.
        start: u32,
        /// End timestamp from the header.
        end: u32,
    },

    /// `server` was zero.
    #[error("server id must not be zero")]
    InvalidServer,

    /// Unrecognized request type byte.
    #[error("unknown request type {0}")]
    UnknownRequestType(u8),

    /// License bytes were neither all-zero nor all-non-zero.
    #[error("license bytes must be entirely zero or entirely non-zero")]
    MalformedLicense,

    /// The request type requires a non-empty license but got the zero sentinel.
    #[error("request type {0:?} requires a license")]
    MissingLicense(crate::RequestType),

    /// The request type requires the zero-license sentinel but got a real one.
    #[error("request type {0:?} must not carry a license")]
    UnexpectedLicense(crate::RequestType),
}

/// Convenience alias for results over [`ProtocolError`].
pub type Result<T> = std::result::Result<T, ProtocolError>;
