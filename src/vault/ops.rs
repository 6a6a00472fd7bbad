//! Vault operations.
//!
//! Every operation first checks that the vault is open, then resolves
//! and type-checks its handles, and only then calls into the crypto
//! provider.  Argument and type errors are raised before any state
//! changes.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::attributes::{SecretAttributes, SecretType};
use super::instance::{validate_material, Inner, Vault};
use super::secret::{SecretHandle, SecretMetadata};
use crate::crypto::{self, ecdh, kdf, random, AES_GCM_TAG_LEN, SHA256_LEN};
use crate::errors::{Result, VaultError};

/// Upper bound on exported secret material (an uncompressed P-256 point).
pub const MAX_SECRET_EXPORT_SIZE: usize = 65;

/// Upper bound on a public key returned by `secret_publickey_get`.
pub const MAX_PUBLIC_KEY_SIZE: usize = 65;

/// How many secrets one `hkdf_sha256` call may derive.
///
/// Two covers splitting a chaining key into an encrypt/decrypt pair.
pub const MAX_DERIVED_OUTPUT_COUNT: usize = 2;

/// Length of secrets produced by `ecdh` and `hkdf_sha256`.
pub const DERIVED_SECRET_LEN: usize = 32;

/// Most bytes one `random_bytes` call returns.
pub const MAX_RANDOM_BYTES: usize = 1 << 20;

/// A derived-output count checked against `MAX` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedOutputCount<const MAX: usize>(usize);

impl<const MAX: usize> DerivedOutputCount<MAX> {
    /// The bound this type enforces.
    pub const LIMIT: usize = MAX;

    pub fn new(count: usize) -> Result<Self> {
        if count > MAX {
            return Err(VaultError::InvalidArgument(format!(
                "at most {MAX} derived outputs are supported, {count} requested"
            )));
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// The output-count bound used by the vault.
pub type HkdfOutputCount = DerivedOutputCount<MAX_DERIVED_OUTPUT_COUNT>;

impl Vault {
    // ------------------------------------------------------------------
    // Stateless primitives
    // ------------------------------------------------------------------

    /// Generate `count` random bytes from the vault's entropy source.
    ///
    /// `count` is checked against `MAX_RANDOM_BYTES` before the vault is
    /// locked.
    pub fn random_bytes(&self, count: usize) -> Result<Vec<u8>> {
        if count > MAX_RANDOM_BYTES {
            return Err(VaultError::InvalidArgument(format!(
                "at most {MAX_RANDOM_BYTES} random bytes per call, {count} requested"
            )));
        }
        let mut bytes = vec![0u8; count];
        self.with_open(|inner| random::fill(inner.entropy.as_mut(), &mut bytes))?;
        Ok(bytes)
    }

    /// SHA-256 digest of `data`.
    pub fn sha256(&self, data: &[u8]) -> Result<[u8; SHA256_LEN]> {
        self.with_open(|_| Ok(crypto::sha256(data)))
    }

    // ------------------------------------------------------------------
    // Secret lifecycle
    // ------------------------------------------------------------------

    /// Generate a new secret with fresh material for `attributes`.
    pub fn secret_generate(&self, attributes: SecretAttributes) -> Result<SecretHandle> {
        self.with_open(|inner| {
            let entropy = inner.entropy.as_mut();
            let material = match attributes.secret_type() {
                SecretType::Buffer | SecretType::Aes128Key | SecretType::Aes256Key => {
                    let mut material = Zeroizing::new(vec![0u8; attributes.length()]);
                    random::fill(entropy, &mut material)?;
                    material
                }
                SecretType::Curve25519PrivateKey => ecdh::generate_x25519(entropy)?,
                SecretType::P256PrivateKey => ecdh::generate_p256(entropy)?,
            };

            let handle = inner.insert(attributes, material)?;
            debug!(%handle, secret_type = %attributes.secret_type(), "generated secret");
            Ok(handle)
        })
    }

    /// Import caller-supplied material.
    ///
    /// The byte length must equal `attributes.length()`; P-256 scalars
    /// must also be valid for the curve.
    pub fn secret_import(&self, attributes: SecretAttributes, material: &[u8]) -> Result<SecretHandle> {
        self.with_open(|inner| {
            validate_material(&attributes, material)?;
            let handle = inner.insert(attributes, Zeroizing::new(material.to_vec()))?;
            debug!(%handle, secret_type = %attributes.secret_type(), "imported secret");
            Ok(handle)
        })
    }

    /// Return a copy of a secret's raw material.
    ///
    /// The result is exactly the material length, never padded to
    /// `MAX_SECRET_EXPORT_SIZE`.
    pub fn secret_export(&self, handle: SecretHandle) -> Result<Zeroizing<Vec<u8>>> {
        self.with_open(|inner| {
            let record = inner.store.resolve(handle)?;
            let material = record.material();
            if material.len() > MAX_SECRET_EXPORT_SIZE {
                return Err(VaultError::ExportTooLarge {
                    len: material.len(),
                    max: MAX_SECRET_EXPORT_SIZE,
                });
            }
            Ok(Zeroizing::new(material.to_vec()))
        })
    }

    /// Public key of a Curve25519 (32 bytes) or P-256 (65 bytes) secret.
    pub fn secret_publickey_get(&self, handle: SecretHandle) -> Result<Vec<u8>> {
        self.with_open(|inner| {
            let record = inner.store.resolve(handle)?;
            let public = match record.attributes().secret_type() {
                SecretType::Curve25519PrivateKey => ecdh::x25519_public_key(record.material())?,
                SecretType::P256PrivateKey => ecdh::p256_public_key(record.material())?,
                actual => {
                    return Err(VaultError::WrongSecretType {
                        expected: "a Curve25519 or P-256 private key",
                        actual,
                    })
                }
            };
            debug_assert!(public.len() <= MAX_PUBLIC_KEY_SIZE);
            Ok(public)
        })
    }

    /// Attributes the secret was created with.
    pub fn secret_attributes_get(&self, handle: SecretHandle) -> Result<SecretAttributes> {
        self.with_open(|inner| Ok(*inner.store.resolve(handle)?.attributes()))
    }

    /// Destroy a secret, wiping its material.
    ///
    /// Persistent secrets are purged from the backend too. Destroying an
    /// unknown or already-destroyed handle fails with `SecretNotFound`.
    pub fn secret_destroy(&self, handle: SecretHandle) -> Result<()> {
        self.with_open(|inner| {
            inner.remove(handle).map_err(|e| {
                if e.is_not_found() {
                    warn!(%handle, "destroy of unknown secret handle");
                }
                e
            })
        })
    }

    /// Every live secret with its attributes, in handle order.
    pub fn secret_list(&self) -> Result<Vec<SecretMetadata>> {
        self.with_open(|inner| Ok(inner.store.list()))
    }

    // ------------------------------------------------------------------
    // Key agreement and derivation
    // ------------------------------------------------------------------

    /// Diffie-Hellman between a private-key secret and a peer public key.
    ///
    /// The shared secret is stored as a new ephemeral 32-byte buffer.
    pub fn ecdh(&self, private_key: SecretHandle, peer_public_key: &[u8]) -> Result<SecretHandle> {
        self.with_open(|inner| {
            let shared = {
                let record = inner.store.resolve(private_key)?;
                match record.attributes().secret_type() {
                    SecretType::Curve25519PrivateKey => {
                        ecdh::x25519_agree(record.material(), peer_public_key)?
                    }
                    SecretType::P256PrivateKey => {
                        ecdh::p256_agree(record.material(), peer_public_key)?
                    }
                    actual => {
                        return Err(VaultError::WrongSecretType {
                            expected: "a Curve25519 or P-256 private key",
                            actual,
                        })
                    }
                }
            };

            let handle = inner.insert(SecretAttributes::buffer(DERIVED_SECRET_LEN)?, shared)?;
            debug!(%handle, "derived shared secret");
            Ok(handle)
        })
    }

    /// Derive `count` (0 to `MAX_DERIVED_OUTPUT_COUNT`) ephemeral 32-byte
    /// buffers from HKDF-SHA256 over the `salt` and `ikm` secrets.
    pub fn hkdf_sha256(
        &self,
        salt: SecretHandle,
        ikm: SecretHandle,
        count: usize,
    ) -> Result<Vec<SecretHandle>> {
        let count = HkdfOutputCount::new(count)?;
        let outputs = vec![SecretAttributes::buffer(DERIVED_SECRET_LEN)?; count.get()];
        self.derive(salt, ikm, &outputs)
    }

    /// HKDF-SHA256 with caller-chosen output attributes.
    ///
    /// Outputs are cut from one HKDF stream in order, each taking its
    /// attributes' length, so two AES keys can be derived directly.
    pub fn hkdf_sha256_with_attributes(
        &self,
        salt: SecretHandle,
        ikm: SecretHandle,
        outputs: &[SecretAttributes],
    ) -> Result<Vec<SecretHandle>> {
        HkdfOutputCount::new(outputs.len())?;
        self.derive(salt, ikm, outputs)
    }

    fn derive(
        &self,
        salt: SecretHandle,
        ikm: SecretHandle,
        outputs: &[SecretAttributes],
    ) -> Result<Vec<SecretHandle>> {
        let total = outputs
            .iter()
            .try_fold(0usize, |total, a| total.checked_add(a.length()))
            .filter(|&total| total <= kdf::MAX_HKDF_OUTPUT)
            .ok_or_else(|| {
                VaultError::InvalidArgument(format!(
                    "HKDF-SHA256 outputs must total at most {} bytes",
                    kdf::MAX_HKDF_OUTPUT
                ))
            })?;

        self.with_open(|inner| {
            let mut okm = Zeroizing::new(vec![0u8; total]);
            {
                let salt = inner.store.resolve(salt)?;
                let ikm = inner.store.resolve(ikm)?;
                crypto::hkdf_sha256(salt.material(), ikm.material(), &mut okm)?;
            }

            // Validate every chunk before storing any of them.
            let mut chunks = Vec::with_capacity(outputs.len());
            let mut offset = 0;
            for attributes in outputs {
                let chunk = &okm[offset..offset + attributes.length()];
                validate_material(attributes, chunk)?;
                chunks.push((*attributes, Zeroizing::new(chunk.to_vec())));
                offset += attributes.length();
            }

            let mut handles = Vec::with_capacity(chunks.len());
            for (attributes, material) in chunks {
                match inner.insert(attributes, material) {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        roll_back(inner, &handles);
                        return Err(e);
                    }
                }
            }

            debug!(count = handles.len(), "derived secrets with HKDF-SHA256");
            Ok(handles)
        })
    }

    // ------------------------------------------------------------------
    // Authenticated encryption
    // ------------------------------------------------------------------

    /// AES-GCM encrypt `plaintext` under an AES key secret.
    ///
    /// Returns ciphertext followed by the 16-byte tag. The vault does not
    /// track nonces: never reuse one under the same key.
    pub fn aead_aes_gcm_encrypt(
        &self,
        key: SecretHandle,
        nonce: u32,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.with_open(|inner| {
            let record = inner.store.resolve(key)?;
            require_aes_key(record.attributes())?;

            let sealed = crypto::aes_gcm_encrypt(record.material(), nonce, aad, plaintext)?;
            let expected = plaintext.len() + AES_GCM_TAG_LEN;
            if sealed.len() != expected {
                return Err(VaultError::Provider(format!(
                    "AES-GCM produced {} bytes, expected {expected}",
                    sealed.len()
                )));
            }
            Ok(sealed)
        })
    }

    /// AES-GCM decrypt and verify ciphertext‖tag under an AES key secret.
    ///
    /// Returns the full plaintext or an error, never partial output.
    pub fn aead_aes_gcm_decrypt(
        &self,
        key: SecretHandle,
        nonce: u32,
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.with_open(|inner| {
            if ciphertext.len() < AES_GCM_TAG_LEN {
                return Err(VaultError::InvalidArgument(format!(
                    "ciphertext must be at least {AES_GCM_TAG_LEN} bytes, got {}",
                    ciphertext.len()
                )));
            }

            let record = inner.store.resolve(key)?;
            require_aes_key(record.attributes())?;

            let plaintext = crypto::aes_gcm_decrypt(record.material(), nonce, aad, ciphertext)
                .map_err(|e| {
                    if matches!(e, VaultError::AuthenticationFailed) {
                        warn!(%key, "AES-GCM authentication failed");
                    }
                    e
                })?;

            let expected = ciphertext.len() - AES_GCM_TAG_LEN;
            if plaintext.len() != expected {
                return Err(VaultError::Provider(format!(
                    "AES-GCM produced {} bytes, expected {expected}",
                    plaintext.len()
                )));
            }
            Ok(plaintext)
        })
    }
}

fn require_aes_key(attributes: &SecretAttributes) -> Result<()> {
    if attributes.secret_type().is_aes_key() {
        Ok(())
    } else {
        Err(VaultError::WrongSecretType {
            expected: "an AES key",
            actual: attributes.secret_type(),
        })
    }
}

/// Undo a partially completed multi-output derivation.
fn roll_back(inner: &mut Inner, handles: &[SecretHandle]) {
    for handle in handles {
        if let Err(e) = inner.remove(*handle) {
            warn!(%handle, "failed to roll back derived secret: {e}");
        }
    }
}
