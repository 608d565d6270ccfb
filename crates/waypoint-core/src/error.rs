//! Error types for the storage engine and request dispatcher.

use thiserror::Error;
use waypoint_proto::ProtocolError;

/// Errors produced while dispatching and handling a single request.
///
/// Every variant here is request-scoped: the caller responds with `ERR`
/// (same request id) and keeps the connection open for the next request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Header decode or validation failed.
    #[error("invalid request: {0}")]
    Protocol(#[from] ProtocolError),

    /// A filesystem operation failed while handling the request.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
