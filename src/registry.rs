//! Registry of open vaults addressed by integer handles.
//!
//! This is the boundary surface: callers hold plain `VaultHandle` and
//! `SecretHandle` values and pass attribute descriptors as JSON.  Each
//! descriptor is decoded once here; the vault itself only sees typed
//! `SecretAttributes`.
//!
//! Every function returns a `Result`, whose error `Display` text is the
//! diagnostic for the failure outcome.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::SHA256_LEN;
use crate::errors::{Result, VaultError};
use crate::vault::attributes;
use crate::vault::{SecretHandle, Vault};

/// Opaque identifier for an open vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VaultHandle(u64);

impl VaultHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VaultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns every vault opened through it.
///
/// Vault handles are process-unique and never reused. Dropping the
/// registry closes every vault it still holds.
#[derive(Default)]
pub struct VaultRegistry {
    vaults: RwLock<HashMap<VaultHandle, Arc<Vault>>>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open an in-memory vault.
    pub fn default_init(&self) -> Result<VaultHandle> {
        self.register(Vault::default_init()?)
    }

    /// Open a file-backed vault at `path`.
    pub fn file_init(&self, path: impl AsRef<Path>) -> Result<VaultHandle> {
        self.register(Vault::file_init(path)?)
    }

    /// Adopt an already constructed vault (e.g. one with seeded entropy).
    pub fn register(&self, vault: Vault) -> Result<VaultHandle> {
        let handle = VaultHandle(vault.id());
        self.vaults
            .write()
            .map_err(|_| VaultError::LockPoisoned)?
            .insert(handle, Arc::new(vault));
        debug!(%handle, "registered vault");
        Ok(handle)
    }

    /// Close a vault and forget its handle.
    pub fn deinit(&self, vault: VaultHandle) -> Result<()> {
        let removed = self
            .vaults
            .write()
            .map_err(|_| VaultError::LockPoisoned)?
            .remove(&vault)
            .ok_or(VaultError::InvalidVaultHandle(vault.0))?;
        removed.deinit()?;
        debug!(handle = %vault, "deinitialized vault");
        Ok(())
    }

    /// Shared reference to an open vault.
    pub fn get(&self, vault: VaultHandle) -> Result<Arc<Vault>> {
        self.vaults
            .read()
            .map_err(|_| VaultError::LockPoisoned)?
            .get(&vault)
            .cloned()
            .ok_or(VaultError::InvalidVaultHandle(vault.0))
    }

    /// Number of open vaults.
    pub fn len(&self) -> usize {
        self.vaults.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    pub fn random_bytes(&self, vault: VaultHandle, count: usize) -> Result<Vec<u8>> {
        self.get(vault)?.random_bytes(count)
    }

    pub fn sha256(&self, vault: VaultHandle, data: &[u8]) -> Result<[u8; SHA256_LEN]> {
        self.get(vault)?.sha256(data)
    }

    pub fn secret_generate(&self, vault: VaultHandle, descriptor: &Value) -> Result<SecretHandle> {
        let vault = self.get(vault)?;
        vault.secret_generate(attributes::decode(descriptor)?)
    }

    pub fn secret_import(
        &self,
        vault: VaultHandle,
        descriptor: &Value,
        material: &[u8],
    ) -> Result<SecretHandle> {
        let vault = self.get(vault)?;
        vault.secret_import(attributes::decode(descriptor)?, material)
    }

    pub fn secret_export(
        &self,
        vault: VaultHandle,
        secret: SecretHandle,
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.get(vault)?.secret_export(secret)
    }

    pub fn secret_publickey_get(&self, vault: VaultHandle, secret: SecretHandle) -> Result<Vec<u8>> {
        self.get(vault)?.secret_publickey_get(secret)
    }

    /// The secret's attributes, encoded as a descriptor.
    pub fn secret_attributes_get(&self, vault: VaultHandle, secret: SecretHandle) -> Result<Value> {
        let attributes = self.get(vault)?.secret_attributes_get(secret)?;
        Ok(attributes::encode(&attributes))
    }

    pub fn secret_destroy(&self, vault: VaultHandle, secret: SecretHandle) -> Result<()> {
        self.get(vault)?.secret_destroy(secret)
    }

    pub fn ecdh(
        &self,
        vault: VaultHandle,
        private_key: SecretHandle,
        peer_public_key: &[u8],
    ) -> Result<SecretHandle> {
        self.get(vault)?.ecdh(private_key, peer_public_key)
    }

    pub fn hkdf_sha256(
        &self,
        vault: VaultHandle,
        salt: SecretHandle,
        ikm: SecretHandle,
        count: usize,
    ) -> Result<Vec<SecretHandle>> {
        self.get(vault)?.hkdf_sha256(salt, ikm, count)
    }

    pub fn aead_aes_gcm_encrypt(
        &self,
        vault: VaultHandle,
        key: SecretHandle,
        nonce: u32,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.get(vault)?
            .aead_aes_gcm_encrypt(key, nonce, aad, plaintext)
    }

    pub fn aead_aes_gcm_decrypt(
        &self,
        vault: VaultHandle,
        key: SecretHandle,
        nonce: u32,
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.get(vault)?
            .aead_aes_gcm_decrypt(key, nonce, aad, ciphertext)
    }
}

impl Drop for VaultRegistry {
    fn drop(&mut self) {
        let vaults = match self.vaults.get_mut() {
            Ok(vaults) => vaults,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, vault) in vaults.drain() {
            // Already-closed vaults report InvalidVaultHandle; nothing to do.
            let _ = vault.deinit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct_and_closable() {
        let registry = VaultRegistry::new();
        let a = registry.default_init().unwrap();
        let b = registry.default_init().unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.deinit(a).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.deinit(a),
            Err(VaultError::InvalidVaultHandle(_))
        ));
    }

    #[test]
    fn unknown_vault_handle_is_rejected() {
        let registry = VaultRegistry::new();
        let err = registry
            .random_bytes(VaultHandle::from_raw(u64::MAX), 4)
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidVaultHandle(_)));
    }
}
