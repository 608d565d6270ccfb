//! The 50-byte request header and request-kind routing.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{errors::ProtocolError, license::License};

/// Earliest timestamp accepted by the archive: 2000-01-01T00:00:00Z.
///
/// `start` must be strictly greater than this value.
pub const MIN_TIMESTAMP: u32 = 946_684_800;

/// Kind of request carried by a [`RequestHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// Append historic entries to a license's file.
    Store,
    /// Read a single license's records in a time range.
    ReadOne,
    /// Read every license's records at one instant, for one server.
    ReadAll,
}

impl RequestType {
    /// Decode a request type from its wire byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownRequestType`] for any byte other than
    /// 1, 2, or 3.
    pub fn from_wire(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            1 => Ok(Self::Store),
            2 => Ok(Self::ReadOne),
            3 => Ok(Self::ReadAll),
            other => Err(ProtocolError::UnknownRequestType(other)),
        }
    }

    /// Encode back to the wire byte.
    #[must_use]
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Store => 1,
            Self::ReadOne => 2,
            Self::ReadAll => 3,
        }
    }
}

/// Raw 50-byte on-the-wire request header, little-endian throughout.
///
/// Layout (field order is significant and matches the wire exactly):
///
/// | Size | Field |
/// |---|---|
/// | 1 | type |
/// | 1 | server |
/// | 4 | start |
/// | 4 | end |
/// | 40 | license |
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct RawRequestHeader {
    kind: u8,
    server: u8,
    start: [u8; 4],
    end: [u8; 4],
    license: [u8; License::SIZE],
}

/// A decoded and validated request header.
///
/// Construct with [`RequestHeader::decode`], which performs the invariant
/// checks from the wire format section: `start` after [`MIN_TIMESTAMP`],
/// `end >= start`, `server != 0`, and the license-per-request-type
/// discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    kind: RequestType,
    server: u8,
    start: u32,
    end: u32,
    license: License,
}

impl RequestHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 50;

    /// Decode and validate a header from the front of `bytes`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::BufferTooShort`] if fewer than [`Self::SIZE`] bytes
    ///   are available.
    /// - [`ProtocolError::UnknownRequestType`] for an unrecognized type byte.
    /// - [`ProtocolError::MalformedLicense`] for a license that is neither
    ///   all-zero nor all-non-zero.
    /// - [`ProtocolError::StartTooEarly`], [`ProtocolError::EndBeforeStart`],
    ///   [`ProtocolError::InvalidServer`] for out-of-range fields.
    /// - [`ProtocolError::MissingLicense`] / [`ProtocolError::UnexpectedLicense`]
    ///   if the license does not match what `kind` requires.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < Self::SIZE {
            return Err(ProtocolError::BufferTooShort { need: Self::SIZE, got: bytes.len() });
        }

        let raw = RawRequestHeader::read_from_bytes(&bytes[..Self::SIZE])
            .unwrap_or_else(|_| unreachable!("length checked above"));

        let kind = RequestType::from_wire(raw.kind)?;
        let start = u32::from_le_bytes(raw.start);
        let end = u32::from_le_bytes(raw.end);
        let license = License::from_bytes(raw.license)?;

        if start <= MIN_TIMESTAMP {
            return Err(ProtocolError::StartTooEarly { start, minimum: MIN_TIMESTAMP });
        }

        if end < start {
            return Err(ProtocolError::EndBeforeStart { start, end });
        }

        if raw.server == 0 {
            return Err(ProtocolError::InvalidServer);
        }

        match kind {
            RequestType::Store | RequestType::ReadOne if license.is_empty() => {
                return Err(ProtocolError::MissingLicense(kind));
            },
            RequestType::ReadAll if !license.is_empty() => {
                return Err(ProtocolError::UnexpectedLicense(kind));
            },
            _ => {},
        }

        Ok(Self { kind, server: raw.server, start, end, license })
    }

    /// Encode this header back to its 50-byte wire representation.
    ///
    /// Provided for client-side test fixtures and round-trip tests; the
    /// server only ever decodes.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let raw = RawRequestHeader {
            kind: self.kind.to_wire(),
            server: self.server,
            start: self.start.to_le_bytes(),
            end: self.end.to_le_bytes(),
            license: *self.license.as_bytes(),
        };

        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    /// Construct a header directly, applying the same validation as
    /// [`RequestHeader::decode`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`RequestHeader::decode`].
    pub fn new(
        kind: RequestType,
        server: u8,
        start: u32,
        end: u32,
        license: License,
    ) -> Result<Self, ProtocolError> {
        let raw = RawRequestHeader {
            kind: kind.to_wire(),
            server,
            start: start.to_le_bytes(),
            end: end.to_le_bytes(),
            license: *license.as_bytes(),
        };

        Self::decode(raw.as_bytes())
    }

    /// The request kind.
    #[must_use]
    pub fn kind(&self) -> RequestType {
        self.kind
    }

    /// The game-shard server id (1..=255).
    #[must_use]
    pub fn server(&self) -> u8 {
        self.server
    }

    /// Start of the requested time window, Unix seconds.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// End of the requested time window, Unix seconds.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// The license this request applies to (or the empty sentinel for
    /// `ReadAll`).
    #[must_use]
    pub fn license(&self) -> License {
        self.license
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_header() -> RequestHeader {
        let license = License::from_plate(&"A".repeat(40)).unwrap();
        RequestHeader::new(RequestType::Store, 1, MIN_TIMESTAMP + 1, MIN_TIMESTAMP + 60, license)
            .unwrap()
    }

    #[test]
    fn decode_round_trips_via_encode() {
        let header = store_header();
        let encoded = header.encode();
        let decoded = RequestHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_short_buffer() {
        let err = RequestHeader::decode(&[0u8; 10]).unwrap_err();
        assert_eq!(err, ProtocolError::BufferTooShort { need: 50, got: 10 });
    }

    #[test]
    fn rejects_start_at_or_before_minimum() {
        let license = License::from_plate(&"A".repeat(40)).unwrap();
        let err =
            RequestHeader::new(RequestType::Store, 1, MIN_TIMESTAMP, MIN_TIMESTAMP, license)
                .unwrap_err();
        assert_eq!(err, ProtocolError::StartTooEarly { start: MIN_TIMESTAMP, minimum: MIN_TIMESTAMP });
    }

    #[test]
    fn rejects_end_before_start() {
        let license = License::from_plate(&"A".repeat(40)).unwrap();
        let err = RequestHeader::new(
            RequestType::Store,
            1,
            MIN_TIMESTAMP + 10,
            MIN_TIMESTAMP + 5,
            license,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::EndBeforeStart { start: MIN_TIMESTAMP + 10, end: MIN_TIMESTAMP + 5 }
        );
    }

    #[test]
    fn rejects_zero_server() {
        let license = License::from_plate(&"A".repeat(40)).unwrap();
        let err = RequestHeader::new(
            RequestType::Store,
            0,
            MIN_TIMESTAMP + 1,
            MIN_TIMESTAMP + 1,
            license,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::InvalidServer);
    }

    #[test]
    fn store_requires_non_empty_license() {
        let err = RequestHeader::new(
            RequestType::Store,
            1,
            MIN_TIMESTAMP + 1,
            MIN_TIMESTAMP + 1,
            License::EMPTY,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::MissingLicense(RequestType::Store));
    }

    #[test]
    fn read_all_rejects_non_empty_license() {
        let license = License::from_plate(&"A".repeat(40)).unwrap();
        let err = RequestHeader::new(
            RequestType::ReadAll,
            1,
            MIN_TIMESTAMP + 1,
            MIN_TIMESTAMP + 1,
            license,
        )
        .unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedLicense(RequestType::ReadAll));
    }

    #[test]
    fn read_all_accepts_empty_license() {
        let header = RequestHeader::new(
            RequestType::ReadAll,
            1,
            MIN_TIMESTAMP + 1,
            MIN_TIMESTAMP + 1,
            License::EMPTY,
        )
        .unwrap();
        assert_eq!(header.kind(), RequestType::ReadAll);
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let mut bytes = store_header().encode();
        bytes[0] = 99;
        let err = RequestHeader::decode(&bytes).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownRequestType(99));
    }
}
