// Append-only JSON archive files
//
// One file per (dataset, run): `<prefix><dataset>_<unix-millis>.json`.
// Files are opened with create_new; an existing name gets a `-N` suffix.
// Nothing in this module rewrites a file, and the only file it removes is a
// partial one it created itself in the same call.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_PREFIX: &str = "ARCHIVED_";

/// Collision suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug)]
pub enum ArchiveError {
    /// Archive directory could not be created or listed.
    Directory { path: String, message: String },
    /// Archive file could not be written.
    Write { path: String, message: String },
    /// Entries could not be serialized.
    Serialize(String),
    /// Every candidate filename was taken.
    NameExhausted { dataset: String },
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory { path, message } => {
                write!(f, "archive directory {path}: {message}")
            }
            Self::Write { path, message } => write!(f, "cannot write archive {path}: {message}"),
            Self::Serialize(msg) => write!(f, "cannot serialize archive entries: {msg}"),
            Self::NameExhausted { dataset } => {
                write!(f, "no free archive filename for dataset '{dataset}'")
            }
        }
    }
}

impl std::error::Error for ArchiveError {}

/// An archive file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFile {
    pub dataset: String,
    pub path: PathBuf,
    /// Number of entries in the JSON array, `None` if the file does not parse.
    pub entries: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ArchiveStore {
    dir: PathBuf,
    prefix: String,
}

impl ArchiveStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `entries` as a pretty JSON array to a new file and return its path.
    pub fn write<T: Serialize>(
        &self,
        dataset: &str,
        timestamp: DateTime<Utc>,
        entries: &[T],
    ) -> Result<PathBuf, ArchiveError> {
        fs::create_dir_all(&self.dir).map_err(|e| ArchiveError::Directory {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        })?;

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ArchiveError::Serialize(e.to_string()))?;

        let stem = format!("{}{}_{}", self.prefix, dataset, timestamp.timestamp_millis());
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}-{attempt}.json")
            };
            let path = self.dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} exists, trying next suffix", path.display());
                    continue;
                }
                Err(e) => {
                    return Err(ArchiveError::Write {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })
                }
            };

            let written = file.write_all(json.as_bytes()).and_then(|_| file.sync_all());
            drop(file);
            discard_if_failed(&path, written).map_err(|e| ArchiveError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            log::info!("archived {} record(s) to {}", entries.len(), path.display());
            return Ok(path);
        }

        Err(ArchiveError::NameExhausted {
            dataset: dataset.to_string(),
        })
    }

    /// Existing archive files, sorted by filename. A missing directory is an empty list.
    pub fn list(&self) -> Result<Vec<ArchiveFile>, ArchiveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let dir_err = |e: io::Error| ArchiveError::Directory {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(dataset) = self.dataset_from_name(name) else {
                continue;
            };

            let entries = fs::read_to_string(&path)
                .ok()
                .and_then(|s| serde_json::from_str::<Vec<serde_json::Value>>(&s).ok())
                .map(|v| v.len());

            files.push(ArchiveFile {
                dataset,
                path,
                entries,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// `ARCHIVED_payoutRules_1700000000000-2.json` → `payoutRules`.
    fn dataset_from_name(&self, name: &str) -> Option<String> {
        let rest = name.strip_prefix(&self.prefix)?.strip_suffix(".json")?;
        let (dataset, stamp) = rest.rsplit_once('_')?;
        let millis = stamp.split('-').next()?;
        if dataset.is_empty() || millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(dataset.to_string())
    }
}

/// Remove a file created by this call when filling it failed.
fn discard_if_failed(path: &Path, written: io::Result<()>) -> io::Result<()> {
    if written.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("cannot remove partial archive {}: {e}", path.display());
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("archives"), DEFAULT_PREFIX);

        let path = store.write("draws", ts(), &["a", "b"]).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("ARCHIVED_draws_{}.json", ts().timestamp_millis())
        );
        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["a", "b"]);
    }

    #[test]
    fn write_never_overwrites() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path(), DEFAULT_PREFIX);

        let first = store.write("draws", ts(), &[1]).unwrap();
        let second = store.write("draws", ts(), &[2]).unwrap();

        assert_ne!(first, second);
        assert!(second.to_str().unwrap().ends_with("-1.json"));
        assert_eq!(fs::read_to_string(&first).unwrap().trim(), "[\n  1\n]");
    }

    #[test]
    fn list_reports_dataset_and_counts() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path(), DEFAULT_PREFIX);
        store.write("payoutRules", ts(), &[1, 2, 3]).unwrap();
        store.write("draws", ts(), &[1]).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let files = store.list().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].dataset, "draws");
        assert_eq!(files[0].entries, Some(1));
        assert_eq!(files[1].dataset, "payoutRules");
        assert_eq!(files[1].entries, Some(3));
    }

    #[test]
    fn failed_fill_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ARCHIVED_draws_1.json");
        fs::write(&path, "[\n  1,").unwrap();

        let err = discard_if_failed(&path, Err(io::Error::new(io::ErrorKind::Other, "disk full")))
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());

        let store = ArchiveStore::new(dir.path(), DEFAULT_PREFIX);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn successful_fill_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ARCHIVED_draws_1.json");
        fs::write(&path, "[]").unwrap();

        discard_if_failed(&path, Ok(())).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("missing"), DEFAULT_PREFIX);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn dataset_names_with_underscores() {
        let store = ArchiveStore::new("x", DEFAULT_PREFIX);
        assert_eq!(
            store.dataset_from_name("ARCHIVED_old_entries_1700000000000-4.json").as_deref(),
            Some("old_entries")
        );
        assert_eq!(store.dataset_from_name("ARCHIVED_draws_abc.json"), None);
        assert_eq!(store.dataset_from_name("other_draws_1.json"), None);
    }
}
