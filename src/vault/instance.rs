//! Vault instance: construction, teardown and the shared state behind
//! one lock.
//!
//! A vault is `Open` from construction until `deinit`, after which it is
//! `Closed` for good.  The store, backend and entropy source live
//! together behind a single mutex, so a concurrent `secret_destroy` can
//! never race an operation that resolved the same handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::attributes::{SecretAttributes, SecretPersistence, SecretType};
use super::backend::{Backend, FileBackend, MemoryBackend};
use super::secret::{SecretHandle, SecretRecord};
use super::store::SecretStore;
use crate::crypto::ecdh;
use crate::crypto::random::{EntropySource, SystemEntropy};
use crate::errors::{Result, VaultError};

/// Process-wide counter for vault ids.
static NEXT_VAULT_ID: AtomicU64 = AtomicU64::new(1);

/// State owned by an open vault.
pub(crate) struct Inner {
    pub(crate) store: SecretStore,
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) entropy: Box<dyn EntropySource>,
}

/// An isolated vault: one secret store, one backend, one entropy source.
///
/// `Vault` is `Send + Sync`; independent vaults share no state.
pub struct Vault {
    id: u64,
    description: String,
    /// `None` once the vault is closed.
    inner: Mutex<Option<Inner>>,
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open an in-memory vault using the OS CSPRNG.
    pub fn default_init() -> Result<Self> {
        Self::with_entropy(SystemEntropy)
    }

    /// Open an in-memory vault drawing randomness from `entropy`.
    pub fn with_entropy(entropy: impl EntropySource + 'static) -> Result<Self> {
        Self::open(Box::new(MemoryBackend::default()), Box::new(entropy))
    }

    /// Open a file-backed vault at `path`, creating the file if missing.
    ///
    /// Persistent secrets already in the file are loaded with fresh handles.
    pub fn file_init(path: impl AsRef<Path>) -> Result<Self> {
        Self::file_init_with_entropy(path, SystemEntropy)
    }

    /// File-backed vault drawing randomness from `entropy`.
    pub fn file_init_with_entropy(
        path: impl AsRef<Path>,
        entropy: impl EntropySource + 'static,
    ) -> Result<Self> {
        let backend = FileBackend::open(path.as_ref())?;
        Self::open(Box::new(backend), Box::new(entropy))
    }

    /// Open a vault over any backend, restoring its persistent secrets.
    pub fn open(mut backend: Box<dyn Backend>, entropy: Box<dyn EntropySource>) -> Result<Self> {
        let description = backend.describe();
        let init_failed = |reason: String| VaultError::BackendInitFailed {
            path: PathBuf::from(&description),
            reason,
        };

        let mut store = SecretStore::new()?;
        let stored = backend.load().map_err(|e| init_failed(e.to_string()))?;

        for mut secret in stored {
            let attributes = secret.attributes;
            let attributes = SecretAttributes::new(
                attributes.secret_type(),
                attributes.persistence(),
                attributes.purpose(),
                attributes.length(),
            )
            .and_then(|a| {
                validate_material(&a, &secret.material)?;
                Ok(a)
            })
            .map_err(|e| init_failed(format!("stored secret {}: {e}", secret.id)))?;

            if !attributes.is_persistent() {
                return Err(init_failed(format!(
                    "stored secret {} is not persistent",
                    secret.id
                )));
            }

            let material = Zeroizing::new(std::mem::take(&mut secret.material));
            let record = SecretRecord::new(attributes, material, Some(secret.id), secret.created_at);
            store.allocate(record)?;
        }

        let id = NEXT_VAULT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(vault = id, backend = %description, restored = store.len(), "vault opened");

        Ok(Self {
            id,
            description,
            inner: Mutex::new(Some(Inner {
                store,
                backend,
                entropy,
            })),
        })
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Close the vault: wipe every live secret and release the backend.
    ///
    /// Durable records of persistent secrets are kept. Any later call,
    /// including a second `deinit`, fails with `InvalidVaultHandle`.
    pub fn deinit(&self) -> Result<()> {
        let mut inner = self
            .lock()?
            .take()
            .ok_or(VaultError::InvalidVaultHandle(self.id))?;

        let destroyed = inner.store.destroy_all();
        inner.backend.close()?;
        debug!(vault = self.id, destroyed, "vault closed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Process-unique id of this vault.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Where the vault keeps persistent secrets ("memory" or a path).
    pub fn backend_description(&self) -> &str {
        &self.description
    }

    /// `true` until `deinit` succeeds.
    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Internals shared with the operations
    // ------------------------------------------------------------------

    fn lock(&self) -> Result<MutexGuard<'_, Option<Inner>>> {
        self.inner.lock().map_err(|_| VaultError::LockPoisoned)
    }

    /// Run `f` against the open state, or fail with `InvalidVaultHandle`.
    pub(crate) fn with_open<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let inner = guard
            .as_mut()
            .ok_or(VaultError::InvalidVaultHandle(self.id))?;
        f(inner)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id)
            .field("backend", &self.description)
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Store new material, writing it durably first if it is persistent.
    ///
    /// On failure nothing is left behind in either the store or backend.
    pub(crate) fn insert(
        &mut self,
        attributes: SecretAttributes,
        material: Zeroizing<Vec<u8>>,
    ) -> Result<SecretHandle> {
        let created_at = Utc::now();
        let backend_id = match attributes.persistence() {
            SecretPersistence::Persistent => {
                Some(self.backend.persist(&attributes, &material, created_at)?)
            }
            SecretPersistence::Ephemeral => None,
        };

        let record = SecretRecord::new(attributes, material, backend_id, created_at);
        match self.store.allocate(record) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                if let Some(id) = backend_id {
                    if let Err(purge_err) = self.backend.purge(id) {
                        warn!(id, "failed to roll back persisted secret: {purge_err}");
                    }
                }
                Err(e)
            }
        }
    }

    /// Destroy a secret, purging its durable record first.
    pub(crate) fn remove(&mut self, handle: SecretHandle) -> Result<()> {
        let backend_id = self.store.resolve(handle)?.backend_id();
        if let Some(id) = backend_id {
            self.backend.purge(id)?;
        }
        self.store.destroy(handle).map(drop)
    }
}

/// Check that `material` fits `attributes` before it enters the store.
pub(crate) fn validate_material(attributes: &SecretAttributes, material: &[u8]) -> Result<()> {
    if material.len() != attributes.length() {
        return Err(VaultError::InvalidSecretMaterial(format!(
            "{} secret needs {} bytes, got {}",
            attributes.secret_type(),
            attributes.length(),
            material.len()
        )));
    }

    if attributes.secret_type() == SecretType::P256PrivateKey {
        ecdh::validate_p256_private_key(material)?;
    }
    Ok(())
}
