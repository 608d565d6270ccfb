//! Fixed-width record scanning over history files on disk.
//!
//! A history file is nothing more than historic entries (§3,
//! [`waypoint_proto::HistoricEntry`]) concatenated in append order. Every
//! function here treats a missing file as an empty one and never creates a
//! file; see `storage` for the write side.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use waypoint_proto::{HistoricEntry, License};

/// Append the `[start, end]` section of `path` to `out`.
///
/// A record is included once its timestamp is `>= start`; scanning then
/// stops right after the first record whose timestamp is `>= end` is
/// emitted. `start == end` therefore yields at most one record: the first
/// one at or after that instant. A missing file contributes nothing.
///
/// Only whole records are considered: a trailing partial record (the file's
/// length is not a multiple of [`HistoricEntry::SIZE`]) is ignored rather
/// than treated as an error, tolerating a write caught mid-append by a
/// reader that holds no lock.
pub fn read_section(path: &Path, start: u32, end: u32, out: &mut Vec<u8>) -> io::Result<()> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    let usable_len = {
        let total_len = file.metadata()?.len();
        (total_len / HistoricEntry::SIZE as u64) * HistoricEntry::SIZE as u64
    };

    let mut remaining = usable_len;
    let mut buf = [0u8; HistoricEntry::SIZE];

    while remaining > 0 {
        file.read_exact(&mut buf)?;
        remaining -= HistoricEntry::SIZE as u64;

        let Some(entry) = HistoricEntry::read_from(&buf) else {
            unreachable!("buf is always exactly HistoricEntry::SIZE bytes")
        };
        let timestamp = entry.timestamp();

        if timestamp < start {
            continue;
        }

        out.extend_from_slice(entry.as_bytes());

        if timestamp >= end {
            break;
        }
    }

    Ok(())
}

/// Read the `[start, end]` section from `path1`, then `path2` if different,
/// concatenating both into a single buffer.
pub fn read_section_pair(
    path1: &Path,
    path2: &Path,
    start: u32,
    end: u32,
    capacity_hint: usize,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(capacity_hint);

    read_section(path1, start, end, &mut out)?;

    if path1 != path2 {
        read_section(path2, start, end, &mut out)?;
    }

    Ok(out)
}

/// Build a ReadAll bundle: every license file directly under `dir`, each
/// filtered to its section at `at` (`start == end == at`).
///
/// Wire format: `[total: u32 LE]` followed by `total` repetitions of
/// `[license: 40 bytes][section_length: u32 LE][section: section_length bytes]`.
/// Files whose section is empty are omitted and not counted in `total`.
/// Directory entries that are not valid 40-byte license file names are
/// skipped. A missing directory yields an empty bundle (`total = 0`).
pub fn read_all_bundle(dir: &Path, at: u32) -> io::Result<Vec<u8>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(0u32.to_le_bytes().to_vec());
        },
        Err(err) => return Err(err),
    };

    let mut total: u32 = 0;
    let mut body = Vec::new();

    for entry in entries {
        let entry = entry?;

        if !entry.file_type()?.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };

        let Ok(license) = License::from_plate(&name) else {
            continue;
        };

        let mut section = Vec::new();
        read_section(&entry.path(), at, at, &mut section)?;

        if section.is_empty() {
            continue;
        }

        body.extend_from_slice(license.as_bytes());
        body.extend_from_slice(&(section.len() as u32).to_le_bytes());
        body.extend_from_slice(&section);
        total += 1;
    }

    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}
