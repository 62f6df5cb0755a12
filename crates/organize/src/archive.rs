//! Archival planning for duplicate rows.
//!
//! Archiving is additive: duplicates are copied into a new JSON file and the
//! source dataset is left untouched. A dry run computes the same entries and
//! skips the write.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sortkeep_io::{ArchiveStore, Record};

use crate::config::OrganizerConfig;
use crate::dedup::detect;
use crate::error::OrganizeError;
use crate::model::{find, LoadedDataset};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveMode {
    #[serde(rename = "dry-run")]
    DryRun,
    #[serde(rename = "live")]
    Live,
}

impl ArchiveMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else {
            Self::Live
        }
    }

    pub fn is_dry_run(&self) -> bool {
        *self == Self::DryRun
    }
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Live => write!(f, "live"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveReason {
    Duplicate,
}

/// A duplicate row plus archive annotations. Underscored keys keep the
/// annotations apart from the row's own columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "_archiveReason")]
    pub archive_reason: ArchiveReason,
    #[serde(rename = "_archivedAt")]
    pub archived_at: String,
    #[serde(rename = "_matchedKey")]
    pub matched_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveResult {
    pub dataset: String,
    pub original_count: usize,
    pub kept_count: usize,
    pub archived_count: usize,
    pub archived_records: Vec<ArchiveEntry>,
    /// Set only by a live run that wrote something.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveRun {
    pub timestamp: String,
    pub mode: ArchiveMode,
    pub processed: Vec<ArchiveResult>,
    pub total_archived: usize,
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Plan (and in live mode, write) the archive for one dataset.
pub fn plan(
    dataset: &str,
    rows: &[Record],
    key_fields: &[String],
    mode: ArchiveMode,
    timestamp: DateTime<Utc>,
    store: &ArchiveStore,
) -> Result<ArchiveResult, OrganizeError> {
    let partition = detect(rows, key_fields);
    let archived_at = format_timestamp(timestamp);

    let archived_records: Vec<ArchiveEntry> = partition
        .duplicates
        .into_iter()
        .map(|group| ArchiveEntry {
            record: group.duplicate,
            archive_reason: ArchiveReason::Duplicate,
            archived_at: archived_at.clone(),
            matched_key: group.key,
        })
        .collect();

    let archive_file = match mode {
        ArchiveMode::Live if !archived_records.is_empty() => {
            Some(store.write(dataset, timestamp, &archived_records)?)
        }
        ArchiveMode::DryRun if !archived_records.is_empty() => {
            log::info!("{dataset}: would archive {} record(s)", archived_records.len());
            None
        }
        _ => None,
    };

    Ok(ArchiveResult {
        dataset: dataset.to_string(),
        original_count: rows.len(),
        kept_count: partition.unique.len(),
        archived_count: archived_records.len(),
        archived_records,
        archive_file,
    })
}

/// Plan every configured dataset that loaded with at least one row.
///
/// Stops at the first archive write failure; results already written stay on disk.
pub fn plan_all(
    config: &OrganizerConfig,
    loaded: &[LoadedDataset],
    mode: ArchiveMode,
    timestamp: DateTime<Utc>,
    store: &ArchiveStore,
) -> Result<ArchiveRun, OrganizeError> {
    let mut processed = Vec::new();
    let mut total_archived = 0;

    for ds in &config.datasets {
        let rows = find(loaded, &ds.id).map(LoadedDataset::rows).unwrap_or(&[]);
        if rows.is_empty() {
            log::debug!("{}: no rows, skipping archive", ds.id);
            continue;
        }
        let result = plan(&ds.id, rows, &ds.key_fields, mode, timestamp, store)?;
        total_archived += result.archived_count;
        processed.push(result);
    }

    Ok(ArchiveRun {
        timestamp: format_timestamp(timestamp),
        mode,
        processed,
        total_archived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn rows() -> Vec<Record> {
        vec![
            Record::from_pairs(&[("Game", "G1"), ("CloseTime", "2024-01-01 10:00")]),
            Record::from_pairs(&[("Game", "G1"), ("CloseTime", "2024-01-01 10:00")]),
            Record::from_pairs(&[("Game", "G2"), ("CloseTime", "2024-01-02 10:00")]),
        ]
    }

    fn key() -> Vec<String> {
        vec!["Game".into(), "CloseTime".into()]
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("archives"), "ARCHIVED_");

        let result = plan("draws", &rows(), &key(), ArchiveMode::DryRun, ts(), &store).unwrap();

        assert_eq!(result.original_count, 3);
        assert_eq!(result.kept_count, 2);
        assert_eq!(result.archived_count, 1);
        assert!(result.archive_file.is_none());
        assert!(!dir.path().join("archives").exists());
    }

    #[test]
    fn live_writes_one_file() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path(), "ARCHIVED_");

        let result = plan("draws", &rows(), &key(), ArchiveMode::Live, ts(), &store).unwrap();
        let path = result.archive_file.clone().unwrap();

        let written: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["Game"], "G1");
        assert_eq!(written[0]["_archiveReason"], "duplicate");
        assert_eq!(written[0]["_archivedAt"], "2024-03-01T12:00:00.000Z");
        assert_eq!(written[0]["_matchedKey"], "g1|2024-01-01 10:00");
    }

    #[test]
    fn live_without_duplicates_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("a"), "ARCHIVED_");
        let unique = &rows()[1..];

        let result = plan("draws", unique, &key(), ArchiveMode::Live, ts(), &store).unwrap();
        assert_eq!(result.archived_count, 0);
        assert!(result.archive_file.is_none());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn dry_run_and_live_agree() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path(), "ARCHIVED_");

        let dry = plan("draws", &rows(), &key(), ArchiveMode::DryRun, ts(), &store).unwrap();
        let live = plan("draws", &rows(), &key(), ArchiveMode::Live, ts(), &store).unwrap();
        assert_eq!(dry.archived_records, live.archived_records);

        let on_disk = std::fs::read_to_string(live.archive_file.unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::to_string_pretty(&dry.archived_records).unwrap());
    }

    #[test]
    fn unwritable_archive_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = ArchiveStore::new(blocker.join("archives"), "ARCHIVED_");

        let err = plan("draws", &rows(), &key(), ArchiveMode::Live, ts(), &store).unwrap_err();
        assert!(matches!(err, OrganizeError::Archive(_)));
    }

    #[test]
    fn mode_strings() {
        assert_eq!(ArchiveMode::from_dry_run(true).to_string(), "dry-run");
        assert_eq!(serde_json::to_value(ArchiveMode::Live).unwrap(), "live");
    }
}
