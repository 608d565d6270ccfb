//! Wire types for the waypoint telemetry archive protocol.
//!
//! This crate is pure data: fixed-width records and headers with byte-exact,
//! little-endian layouts, plus the validation rules that turn raw bytes into
//! a [`RequestHeader`]. It performs no I/O and knows nothing about sockets,
//! encryption, or the filesystem — those live in `waypoint-crypto` and
//! `waypoint-core`.
//!
//! # Layouts
//!
//! - [`HistoricEntry`]: the 36-byte positional sample appended to and read
//!   back from storage.
//! - [`License`]: the 40-byte plate identifier, either all-zero (sentinel)
//!   or all-non-zero (real).
//! - [`RequestHeader`]: the 50-byte request envelope that precedes a
//!   request's payload.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod errors;
mod header;
mod license;
mod record;

pub use errors::{ProtocolError, Result};
pub use header::{MIN_TIMESTAMP, RequestHeader, RequestType};
pub use license::License;
pub use record::HistoricEntry;

/// Maximum plaintext payload size accepted on the wire, in either direction.
///
/// Frames claiming a larger length are a protocol error that closes the
/// connection before decryption is attempted.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Three-byte success acknowledgement payload.
pub const ACK: &[u8; 3] = b"ACK";

/// Three-byte request-level failure payload.
pub const ERR: &[u8; 3] = b"ERR";
