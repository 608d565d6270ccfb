//! Entry point from a decrypted packet payload to a response body.

use waypoint_proto::RequestHeader;

use crate::{
    error::DispatchError,
    mutex_registry::FileMutexRegistry,
    storage::{self, Storage},
};

/// Decode, validate, and route one decrypted payload.
///
/// `payload` is the full plaintext of a framed packet: the 50-byte header
/// followed by the request body (only meaningful for Store). Returns
/// `Ok(None)` for a request with no response body (the caller sends `ACK`),
/// `Ok(Some(body))` for a Read-kind request, or `Err` for any decode,
/// validation, or handler failure (the caller sends `ERR`).
///
/// # Errors
///
/// - [`DispatchError::Protocol`] if the header fails to decode or validate.
/// - [`DispatchError::Io`] if a handler's filesystem access fails.
pub fn dispatch(
    storage: &Storage,
    registry: &FileMutexRegistry,
    payload: &[u8],
) -> Result<Option<Vec<u8>>, DispatchError> {
    let header = RequestHeader::decode(payload)?;
    let body = &payload[RequestHeader::SIZE..];

    storage::handle(storage, registry, &header, body)
}
