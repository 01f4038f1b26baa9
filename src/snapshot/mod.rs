//! Snapshot persistence
//!
//! The in-memory store is authoritative; a JSON snapshot file gives it
//! restart durability. The file carries a CRC32 integrity checksum over the
//! serialized state and a format version; loading verifies both and refuses
//! corrupt or unknown files rather than serving partial state.
//!
//! Writes go to a temp file in the same directory followed by a rename, so
//! a crash mid-write leaves the previous snapshot intact.

pub mod errors;

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::gray::GrayRule;
use crate::store::{ConfigItem, Namespace};

pub use errors::{SnapshotError, SnapshotResult};

/// Current snapshot format version
pub const FORMAT_VERSION: u8 = 1;

/// Full exported state of the store and gray rule registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreState {
    pub namespaces: Vec<Namespace>,
    pub items: Vec<ConfigItem>,
    pub rules: Vec<GrayRule>,
}

/// On-disk snapshot envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    format_version: u8,
    created_at: String,
    checksum: String,
    state: StoreState,
}

/// Computes the formatted CRC32 checksum of the canonical state encoding.
fn state_checksum(state: &StoreState) -> SnapshotResult<String> {
    let bytes = serde_json::to_vec(state)?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes);
    Ok(format!("crc32:{:08x}", hasher.finalize()))
}

/// Writes a snapshot atomically (temp file + rename).
pub fn write_snapshot(path: &Path, state: &StoreState) -> SnapshotResult<()> {
    let file = SnapshotFile {
        format_version: FORMAT_VERSION,
        created_at: Utc::now().to_rfc3339(),
        checksum: state_checksum(state)?,
        state: state.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads and verifies a snapshot.
pub fn load_snapshot(path: &Path) -> SnapshotResult<StoreState> {
    let json = fs::read_to_string(path)?;
    let file: SnapshotFile = serde_json::from_str(&json)?;

    if file.format_version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(file.format_version));
    }

    let computed = state_checksum(&file.state)?;
    if computed != file.checksum {
        return Err(SnapshotError::ChecksumMismatch {
            expected: file.checksum,
            computed,
        });
    }

    Ok(file.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConfigFormat, VersionStore};

    fn sample_state() -> StoreState {
        let store = VersionStore::new();
        store.create_namespace("demo", "Demo", "demo app").unwrap();
        store
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        store.publish("demo", "app.yaml").unwrap();
        let (namespaces, items) = store.export().unwrap();
        StoreState {
            namespaces,
            items,
            rules: vec![GrayRule::new("demo", "app.yaml", 25, true).unwrap()],
        }
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graydb.snapshot.json");

        let state = sample_state();
        write_snapshot(&path, &state).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_corrupt_file_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graydb.snapshot.json");

        write_snapshot(&path, &sample_state()).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        // Flip the stored value without updating the checksum.
        let tampered = json.replace("a: 1", "a: 9");
        assert_ne!(json, tampered);
        fs::write(&path, tampered).unwrap();

        match load_snapshot(&path) {
            Err(SnapshotError::ChecksumMismatch { .. }) => {}
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_version_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graydb.snapshot.json");

        write_snapshot(&path, &sample_state()).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        let bumped = json.replace("\"format_version\": 1", "\"format_version\": 9");
        fs::write(&path, bumped).unwrap();

        match load_snapshot(&path) {
            Err(SnapshotError::UnsupportedVersion(9)) => {}
            other => panic!("expected unsupported version, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match load_snapshot(&dir.path().join("absent.json")) {
            Err(SnapshotError::Io(_)) => {}
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
