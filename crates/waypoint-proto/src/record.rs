//! The 36-byte historic entry record.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A single positional sample, exactly as it appears on disk and on the wire.
///
/// All fields are little-endian. The server treats everything but
/// [`HistoricEntry::timestamp`] as opaque payload: it never interprets,
/// reorders, or rewrites `character_id`, the position/heading/speed floats,
/// or the flag words.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct HistoricEntry {
    timestamp: [u8; 4],
    character_id: [u8; 4],
    x: [u8; 4],
    y: [u8; 4],
    z: [u8; 4],
    heading: [u8; 4],
    speed: [u8; 4],
    character_flags: [u8; 4],
    user_flags: [u8; 4],
}

impl HistoricEntry {
    /// Size of one record on the wire.
    pub const SIZE: usize = 36;

    /// Unix timestamp, in seconds, this sample was taken at.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_le_bytes(self.timestamp)
    }

    /// Borrow this entry as its raw 36-byte wire representation.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        zerocopy::IntoBytes::as_bytes(self)
    }

    /// Parse one entry from an exactly-[`HistoricEntry::SIZE`]-byte slice.
    ///
    /// Returns `None` if `bytes` is not exactly [`HistoricEntry::SIZE`] bytes
    /// long. All bit patterns of the underlying fields are valid, so no
    /// further validation is performed.
    #[must_use]
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        zerocopy::FromBytes::read_from_bytes(bytes).ok()
    }

    /// Build an entry from its individual fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: u32,
        character_id: u32,
        x: f32,
        y: f32,
        z: f32,
        heading: f32,
        speed: f32,
        character_flags: u32,
        user_flags: u32,
    ) -> Self {
        Self {
            timestamp: timestamp.to_le_bytes(),
            character_id: character_id.to_le_bytes(),
            x: x.to_le_bytes(),
            y: y.to_le_bytes(),
            z: z.to_le_bytes(),
            heading: heading.to_le_bytes(),
            speed: speed.to_le_bytes(),
            character_flags: character_flags.to_le_bytes(),
            user_flags: user_flags.to_le_bytes(),
        }
    }
}

impl std::fmt::Debug for HistoricEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoricEntry").field("timestamp", &self.timestamp()).finish_non_exhaustive()
    }
}
