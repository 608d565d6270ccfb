//! The 40-byte license identifier.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::ProtocolError;

/// Fixed 40-byte license plate identifier.
///
/// Exactly two shapes are valid on the wire: every byte non-zero (a real
/// license, used as a directory entry name), or every byte zero (the
/// sentinel meaning "no license / all licenses", used by
/// [`crate::RequestType::ReadAll`]). There is no partial padding — a buffer
/// with some zero and some non-zero bytes is malformed and rejected by
/// [`License::from_bytes`].
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct License([u8; Self::SIZE]);

impl License {
    /// Size of the license field on the wire.
    pub const SIZE: usize = 40;

    /// The all-zero sentinel meaning "no license".
    pub const EMPTY: License = License([0u8; Self::SIZE]);

    /// Validate and wrap raw license bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedLicense`] if the bytes are neither
    /// all-zero nor all-non-zero.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Result<Self, ProtocolError> {
        let zero_count = bytes.iter().filter(|b| **b == 0).count();

        if zero_count != 0 && zero_count != Self::SIZE {
            return Err(ProtocolError::MalformedLicense);
        }

        Ok(Self(bytes))
    }

    /// Build a real (non-empty) license from a string.
    ///
    /// The wire format has no notion of a partially-filled license: a real
    /// license occupies all 40 bytes with no zero padding (see
    /// [`License::from_bytes`]), so `plate` must be exactly [`License::SIZE`]
    /// bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedLicense`] if `plate` is not exactly
    /// [`License::SIZE`] bytes long, or contains a NUL byte (which would be
    /// indistinguishable from the all-zero sentinel once mixed with other
    /// bytes, and is rejected outright by [`License::from_bytes`] anyway).
    pub fn from_plate(plate: &str) -> Result<Self, ProtocolError> {
        if plate.len() != Self::SIZE || plate.as_bytes().contains(&0) {
            return Err(ProtocolError::MalformedLicense);
        }

        let mut bytes = [0u8; Self::SIZE];
        bytes.copy_from_slice(plate.as_bytes());

        Ok(Self(bytes))
    }

    /// `true` if this is the all-zero "no license" sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Raw 40-byte wire representation.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// The NUL-stripped string form, or `None` for the empty sentinel.
    #[must_use]
    pub fn as_plate(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        Some(self.0.iter().copied().filter(|b| *b != 0).map(char::from).collect())
    }
}

impl std::fmt::Debug for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_plate() {
            Some(plate) => write!(f, "License({plate:?})"),
            None => write!(f, "License(<empty>)"),
        }
    }
}
