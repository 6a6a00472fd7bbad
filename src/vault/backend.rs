//! Storage backends behind a vault.
//!
//! The backend only ever sees `Persistent` secrets.  `MemoryBackend`
//! keeps nothing, so persistence lasts as long as the process;
//! `FileBackend` keeps every persistent secret in one vault file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::attributes::SecretAttributes;
use super::format::{self, StoredSecret, VaultDocument};
use crate::errors::{Result, VaultError};

/// Durable storage for persistent secrets.
pub trait Backend: Send {
    /// Human-readable description, e.g. the file path.
    fn describe(&self) -> String;

    /// Every persistent secret currently stored, in insertion order.
    fn load(&mut self) -> Result<Vec<StoredSecret>>;

    /// Durably store a secret and return its record id.
    fn persist(
        &mut self,
        attributes: &SecretAttributes,
        material: &[u8],
        created_at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Remove a durable record. Unknown ids are ignored.
    fn purge(&mut self, id: u64) -> Result<()>;

    /// Release backend resources. Durable records are kept.
    fn close(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Ephemeral backend: nothing outlives the vault.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    next_id: u64,
}

impl Backend for MemoryBackend {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&mut self) -> Result<Vec<StoredSecret>> {
        Ok(Vec::new())
    }

    fn persist(&mut self, _: &SecretAttributes, _: &[u8], _: DateTime<Utc>) -> Result<u64> {
        self.next_id += 1;
        Ok(self.next_id)
    }

    fn purge(&mut self, _id: u64) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// Backend storing persistent secrets in a single vault file.
///
/// The file is re-read for every change so no second copy of the
/// material stays resident in the backend.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Open the vault file at `path`, creating an empty one if missing.
    ///
    /// Fails with `BackendInitFailed` if the file is unreadable or corrupt,
    /// or if a new file cannot be written at that location.
    pub fn open(path: &Path) -> Result<Self> {
        let init_failed = |reason: String| VaultError::BackendInitFailed {
            path: path.to_path_buf(),
            reason,
        };

        if path.exists() {
            format::read_document(path).map_err(|e| init_failed(e.to_string()))?;
            debug!(path = %path.display(), "opened vault file");
        } else {
            format::write_document(path, &VaultDocument::empty())
                .map_err(|e| init_failed(e.to_string()))?;
            debug!(path = %path.display(), "created vault file");
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&mut self) -> Result<Vec<StoredSecret>> {
        let mut document = format::read_document(&self.path)?;
        Ok(std::mem::take(&mut document.secrets))
    }

    fn persist(
        &mut self,
        attributes: &SecretAttributes,
        material: &[u8],
        created_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut document = format::read_document(&self.path)?;
        let id = document.next_id;

        document.next_id += 1;
        document.secrets.push(StoredSecret {
            id,
            attributes: *attributes,
            material: material.to_vec(),
            created_at,
        });

        format::write_document(&self.path, &document)?;
        debug!(path = %self.path.display(), id, "persisted secret");
        Ok(id)
    }

    fn purge(&mut self, id: u64) -> Result<()> {
        let mut document = format::read_document(&self.path)?;
        let before = document.secrets.len();
        document.secrets.retain(|s| s.id != id);

        if document.secrets.len() != before {
            format::write_document(&self.path, &document)?;
            debug!(path = %self.path.display(), id, "purged secret");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        debug!(path = %self.path.display(), "closed vault file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::attributes::{SecretPersistence, SecretType};
    use tempfile::TempDir;

    fn aes_attrs() -> SecretAttributes {
        SecretAttributes::key(SecretType::Aes128Key, SecretPersistence::Persistent).unwrap()
    }

    #[test]
    fn open_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.svlt");
        let mut backend = FileBackend::open(&path).unwrap();
        assert!(path.exists());
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn open_fails_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("v.svlt");
        let err = FileBackend::open(&path).unwrap_err();
        assert!(matches!(err, VaultError::BackendInitFailed { .. }));
    }

    #[test]
    fn persist_and_purge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.svlt");
        let mut backend = FileBackend::open(&path).unwrap();

        let a = backend.persist(&aes_attrs(), &[1u8; 16], Utc::now()).unwrap();
        let b = backend.persist(&aes_attrs(), &[2u8; 16], Utc::now()).unwrap();
        assert_ne!(a, b);

        backend.purge(a).unwrap();
        let loaded = backend.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, b);
        assert_eq!(loaded[0].material, vec![2u8; 16]);

        // Purging an unknown id is a no-op.
        backend.purge(999).unwrap();
    }

    #[test]
    fn record_ids_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.svlt");

        let first = {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.persist(&aes_attrs(), &[1u8; 16], Utc::now()).unwrap()
        };

        let mut backend = FileBackend::open(&path).unwrap();
        let second = backend.persist(&aes_attrs(), &[2u8; 16], Utc::now()).unwrap();
        assert!(second > first);
    }
}
