//! Path resolution and the three request handlers (Store, ReadOne, ReadAll).

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use waypoint_proto::{HistoricEntry, RequestHeader, RequestType};

use crate::{error::DispatchError, history, mutex_registry::FileMutexRegistry};

/// Root-anchored storage engine.
///
/// Holds only the archive root; all mutable state (the per-path mutexes) is
/// kept in the caller-supplied [`FileMutexRegistry`], so a `Storage` can be
/// freely shared across connection tasks behind an `Arc`.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Anchor a storage engine at `root`, creating the directory if absent.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `root` cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The two candidate file paths for a header's `(server, start, end,
    /// license)`, per the day-bucket layout `<root>/c<server>/<date>/[<license>]`.
    ///
    /// Dates are the UTC calendar date of `start` and `end` respectively,
    /// formatted `YYYY-MM-DD`. When a license is present (Store, ReadOne) it
    /// is appended as the file name; for ReadAll (empty license) the two
    /// paths are directories.
    #[must_use]
    pub fn paths(&self, header: &RequestHeader) -> (PathBuf, PathBuf) {
        let date1 = day_bucket(header.start());
        let date2 = day_bucket(header.end());

        let mut path1 = self.root.join(format!("c{}", header.server())).join(&date1);
        let mut path2 = self.root.join(format!("c{}", header.server())).join(&date2);

        if let Some(plate) = header.license().as_plate() {
            path1.push(&plate);
            path2.push(&plate);
        }

        (path1, path2)
    }

    /// Handle a Store request: append `body` (the payload past the header)
    /// to the license's file for `header.start()`'s day, creating parent
    /// directories as needed.
    ///
    /// Holds the file mutex for the target path for the whole append. The
    /// caller is trusted to have already validated `header` and that `body`
    /// is a whole number of [`HistoricEntry::SIZE`]-byte records; this
    /// method copies it verbatim without parsing.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] if the directory or file cannot be
    /// created or written.
    pub fn store(
        &self,
        registry: &FileMutexRegistry,
        header: &RequestHeader,
        body: &[u8],
    ) -> Result<(), DispatchError> {
        let (path, _) = self.paths(header);

        tracing::debug!(path = %path.display(), start = header.start(), "store request");

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        registry.with_lock(&path, || append_to_file(&path, body))?;

        Ok(())
    }

    /// Handle a ReadOne request: the `[start, end]` section of a single
    /// license's file(s), across one or two day-buckets.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] if either file exists but cannot be
    /// read; a missing file contributes an empty section rather than an
    /// error.
    pub fn read_one(&self, header: &RequestHeader) -> Result<Vec<u8>, DispatchError> {
        let (path1, path2) = self.paths(header);

        tracing::debug!(start = header.start(), end = header.end(), "read-one request");

        let capacity_hint =
            (u64::from(header.end()) - u64::from(header.start())) as usize * HistoricEntry::SIZE;

        let buffer =
            history::read_section_pair(&path1, &path2, header.start(), header.end(), capacity_hint)?;

        Ok(buffer)
    }

    /// Handle a ReadAll request: every license's section at instant
    /// `header.start()`, bundled together (§4.5). The header's `end` field
    /// is ignored; the scan window collapses to a single point.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] on directory listing or file read
    /// failure; a missing day directory yields an empty bundle.
    pub fn read_all(&self, header: &RequestHeader) -> Result<Vec<u8>, DispatchError> {
        let (dir, _) = self.paths(header);
        let bundle = history::read_all_bundle(&dir, header.start())?;
        Ok(bundle)
    }
}

fn append_to_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(body)
}

/// `std::fs::create_dir_all`, but newly created directories get mode 0755 on
/// Unix regardless of the process umask.
fn create_dir_all(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
    }

    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(path)
    }
}

fn day_bucket(timestamp: u32) -> String {
    let datetime = DateTime::<Utc>::from_timestamp(i64::from(timestamp), 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default());
    datetime.format("%Y-%m-%d").to_string()
}

/// Route a decoded header to the matching handler.
///
/// Returns `None` for requests with no response body (Store, which always
/// ACKs), or `Some(body)` for Read-kind requests.
///
/// # Errors
///
/// Propagates whatever the underlying handler returns.
pub fn handle(
    storage: &Storage,
    registry: &FileMutexRegistry,
    header: &RequestHeader,
    body: &[u8],
) -> Result<Option<Vec<u8>>, DispatchError> {
    match header.kind() {
        RequestType::Store => {
            storage.store(registry, header, body)?;
            Ok(None)
        },
        RequestType::ReadOne => Ok(Some(storage.read_one(header)?)),
        RequestType::ReadAll => Ok(Some(storage.read_all(header)?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::tempdir;
    use waypoint_proto::License;

    use super::*;

    const MIN_TIMESTAMP: u32 = waypoint_proto::MIN_TIMESTAMP;

    fn store_header(license: License, start: u32, end: u32) -> RequestHeader {
        RequestHeader::new(RequestType::Store, 1, start, end, license).unwrap()
    }

    fn read_one_header(license: License, start: u32, end: u32) -> RequestHeader {
        RequestHeader::new(RequestType::ReadOne, 1, start, end, license).unwrap()
    }

    fn read_all_header(start: u32, end: u32) -> RequestHeader {
        RequestHeader::new(RequestType::ReadAll, 1, start, end, License::EMPTY).unwrap()
    }

    fn entry_bytes(timestamp: u32) -> Vec<u8> {
        HistoricEntry::new(timestamp, 1, 0.0, 0.0, 0.0, 0.0, 0.0, 0, 0).as_bytes().to_vec()
    }

    #[test]
    fn paths_with_license_append_plate_segment() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let plate = "ABC123".to_string() + &"0".repeat(34);
        let license = License::from_plate(&plate).unwrap();
        let header = store_header(license, MIN_TIMESTAMP + 1, MIN_TIMESTAMP + 1);

        let (path1, path2) = storage.paths(&header);
        assert_eq!(path1, path2);
        assert!(path1.ends_with(&plate));
    }

    #[test]
    fn paths_without_license_are_directories() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let header = read_all_header(MIN_TIMESTAMP + 1, MIN_TIMESTAMP + 1);

        let (path1, _) = storage.paths(&header);
        assert!(path1.file_name().is_some());
        assert!(!path1.to_string_lossy().contains("ABC"));
    }

    #[test]
    fn store_then_read_one_round_trips() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let registry = FileMutexRegistry::new();
        let license = License::from_plate(&"A".repeat(40)).unwrap();

        let start = 1_700_000_000;
        let end = 1_700_000_060;
        let body = [entry_bytes(start), entry_bytes(end)].concat();

        let header = store_header(license, start, end);
        storage.store(&registry, &header, &body).unwrap();

        let read_header = read_one_header(license, start, end);
        let result = storage.read_one(&read_header).unwrap();

        assert_eq!(result, body);
    }

    #[test]
    fn read_one_on_empty_archive_is_empty() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let license = License::from_plate(&("NEVERWRITTEN".to_string() + &"0".repeat(28))).unwrap();

        let header = read_one_header(license, MIN_TIMESTAMP + 1, MIN_TIMESTAMP + 100);
        let result = storage.read_one(&header).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn cross_day_store_reads_span_two_files() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let registry = FileMutexRegistry::new();
        let license = License::from_plate(&"C".repeat(40)).unwrap();

        // 2024-01-01 23:59:30 UTC and 2024-01-02 00:00:30 UTC.
        let day1_ts = 1_704_153_570;
        let day2_ts = 1_704_153_630;

        let header1 = store_header(license, day1_ts, day1_ts);
        storage.store(&registry, &header1, &entry_bytes(day1_ts)).unwrap();

        let header2 = store_header(license, day2_ts, day2_ts);
        storage.store(&registry, &header2, &entry_bytes(day2_ts)).unwrap();

        let read_header = read_one_header(license, day1_ts, day2_ts);
        let result = storage.read_one(&read_header).unwrap();

        assert_eq!(result.len(), HistoricEntry::SIZE * 2);
    }

    #[test]
    fn read_all_bundles_every_license_for_the_day() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let registry = FileMutexRegistry::new();

        let license_a = License::from_plate(&"A".repeat(40)).unwrap();
        let license_b = License::from_plate(&"B".repeat(40)).unwrap();
        let t = 1_700_000_000;

        storage
            .store(&registry, &store_header(license_a, t, t), &entry_bytes(t))
            .unwrap();
        storage
            .store(&registry, &store_header(license_b, t + 5, t + 5), &entry_bytes(t + 5))
            .unwrap();

        let header = read_all_header(t, t);
        let bundle = storage.read_all(&header).unwrap();

        let total = u32::from_le_bytes(bundle[0..4].try_into().unwrap());
        assert_eq!(total, 2);
    }
}
