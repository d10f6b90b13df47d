// Path: crates/alerting/src/store.rs
//! The alert deduplication store.
//!
//! An entry records that the alert for an `AlertKey` was delivered during the
//! voting period ending at `voting_end_time`. A voting period is identified by
//! `(proposal_id, voting_end_time)`, so an entry whose end time differs from the
//! proposal's current one does not suppress a new alert. Entries are evicted
//! once their end time has passed.

use govwatch_types::{AlertKey, ErrorCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors raised while loading or persisting the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state file could not be read or written.
    #[error("Alert state I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The state file exists but is not a valid snapshot.
    #[error("Alert state at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "STORE_IO",
            Self::Corrupt { .. } => "STORE_CORRUPT",
        }
    }
}

/// When an alert was delivered and for which voting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub voting_end_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub alerted_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    key: AlertKey,
    #[serde(flatten)]
    record: AlertRecord,
}

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default)]
pub struct AlertStore {
    entries: HashMap<AlertKey, AlertRecord>,
    path: Option<PathBuf>,
    // Bumped on every mutation; equal to `persisted` when the file is current.
    generation: u64,
    persisted: u64,
}

/// A serialized snapshot taken under the store lock and written outside it.
#[derive(Debug)]
pub struct PendingSnapshot {
    path: PathBuf,
    data: Vec<u8>,
    generation: u64,
}

impl PendingSnapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store generation this snapshot captures.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Writes beside the target and renames, so a crash never leaves a torn
    /// file. Blocking.
    pub fn write(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        let io_err = |source| StoreError::Io {
            path: tmp.clone(),
            source,
        };
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(&self.data).map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl AlertStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// An empty store that will overwrite whatever is at `path` on persist.
    pub fn fresh(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        }
    }

    /// Opens a store backed by a JSON file. A missing file starts empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut store = Self::fresh(path);
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let snapshot: Snapshot =
            serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!("unsupported snapshot version {}", snapshot.version),
            });
        }
        store.entries = snapshot
            .entries
            .into_iter()
            .map(|e| (e.key, e.record))
            .collect();
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &AlertKey) -> Option<&AlertRecord> {
        self.entries.get(key)
    }

    /// True when the alert for `key` was already delivered in the voting
    /// period ending at `voting_end_time`.
    pub fn is_alerted(&self, key: &AlertKey, voting_end_time: OffsetDateTime) -> bool {
        self.entries
            .get(key)
            .is_some_and(|r| r.voting_end_time == voting_end_time)
    }

    /// Records a delivered alert. Only call after the sink confirmed delivery.
    pub fn mark_alerted(
        &mut self,
        key: AlertKey,
        voting_end_time: OffsetDateTime,
        alerted_at: OffsetDateTime,
    ) {
        self.entries.insert(
            key,
            AlertRecord {
                voting_end_time,
                alerted_at,
            },
        );
        self.touch();
    }

    /// Drops the entry for `key`, e.g. once the validator has voted.
    pub fn clear(&mut self, key: &AlertKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Drops every entry whose voting period has ended. Returns how many.
    pub fn evict_expired(&mut self, now: OffsetDateTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, r| r.voting_end_time > now);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            self.touch();
        }
        evicted
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// True when the store has changes not yet written to its file.
    pub fn is_dirty(&self) -> bool {
        self.generation != self.persisted
    }

    /// Serializes the current entries if the store is file-backed and has
    /// changed since the last successful write.
    pub fn snapshot(&self) -> Result<Option<PendingSnapshot>, StoreError> {
        let Some(path) = self.path.clone() else {
            return Ok(None);
        };
        if !self.is_dirty() {
            return Ok(None);
        }
        let mut entries: Vec<SnapshotEntry> = self
            .entries
            .iter()
            .map(|(key, record)| SnapshotEntry {
                key: key.clone(),
                record: record.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries,
        };
        let data = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(PendingSnapshot {
            path,
            data,
            generation: self.generation,
        }))
    }

    /// Records that the snapshot taken at `generation` reached disk. Changes
    /// made after that snapshot keep the store dirty.
    pub fn mark_persisted(&mut self, generation: u64) {
        self.persisted = generation;
    }

    /// Snapshots and writes in place. Blocking.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        if let Some(pending) = self.snapshot()? {
            pending.write()?;
            self.mark_persisted(pending.generation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govwatch_types::Validator;
    use time::macros::datetime;

    fn key(id: &str) -> AlertKey {
        AlertKey::new(&Validator::new("cosmoshub", "cosmosvaloper1abc"), id)
    }

    #[test]
    fn test_alerted_is_scoped_to_voting_period() {
        let mut store = AlertStore::in_memory();
        let end = datetime!(2026-10-16 08:00 UTC);
        store.mark_alerted(key("42"), end, datetime!(2026-10-15 22:00 UTC));

        assert!(store.is_alerted(&key("42"), end));
        assert!(!store.is_alerted(&key("43"), end));
        // A different end time is a different voting period.
        assert!(!store.is_alerted(&key("42"), datetime!(2026-10-17 08:00 UTC)));
    }

    #[test]
    fn test_evict_expired() {
        let mut store = AlertStore::in_memory();
        let now = datetime!(2026-10-15 12:00 UTC);
        store.mark_alerted(key("1"), datetime!(2026-10-15 11:59 UTC), now);
        store.mark_alerted(key("2"), now, now);
        store.mark_alerted(key("3"), datetime!(2026-10-16 00:00 UTC), now);

        assert_eq!(store.evict_expired(now), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&key("3")).is_some());
    }

    #[test]
    fn test_clear() {
        let mut store = AlertStore::in_memory();
        let end = datetime!(2026-10-16 08:00 UTC);
        store.mark_alerted(key("42"), end, end);
        assert!(store.clear(&key("42")));
        assert!(!store.clear(&key("42")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let end = datetime!(2026-10-16 08:00 UTC);

        let mut store = AlertStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.mark_alerted(key("42"), end, datetime!(2026-10-15 22:00 UTC));
        store.persist().unwrap();

        let reopened = AlertStore::open(&path).unwrap();
        assert!(reopened.is_alerted(&key("42"), end));
        assert_eq!(
            reopened.get(&key("42")).unwrap().alerted_at,
            datetime!(2026-10-15 22:00 UTC)
        );
    }

    #[test]
    fn test_changes_after_snapshot_stay_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let end = datetime!(2026-10-16 08:00 UTC);

        let mut store = AlertStore::open(&path).unwrap();
        store.mark_alerted(key("1"), end, end);
        let pending = store.snapshot().unwrap().unwrap();
        store.mark_alerted(key("2"), end, end);
        pending.write().unwrap();
        store.mark_persisted(pending.generation());
        assert!(store.is_dirty());

        let on_disk = AlertStore::open(&path).unwrap();
        assert_eq!(on_disk.len(), 1);

        store.persist().unwrap();
        assert!(!store.is_dirty());
        assert!(store.snapshot().unwrap().is_none());
        assert_eq!(AlertStore::open(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_in_memory_store_has_no_snapshot() {
        let mut store = AlertStore::in_memory();
        let end = datetime!(2026-10-16 08:00 UTC);
        store.mark_alerted(key("1"), end, end);
        assert!(store.snapshot().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        fs::write(&path, b"not json").unwrap();
        let err = AlertStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(err.code(), "STORE_CORRUPT");
    }
}
