//! AES-GCM authenticated encryption with associated data.
//!
//! The caller supplies a 32-bit nonce per call.  It is expanded to the
//! 96-bit GCM nonce as 8 zero bytes followed by the big-endian counter.
//! Nonce uniqueness under a key is the caller's responsibility.
//!
//! Layout of a sealed buffer:
//!   [ ciphertext (same length as plaintext) | 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};

use crate::errors::{Result, VaultError};

/// Size of the GCM authentication tag in bytes.
pub const AES_GCM_TAG_LEN: usize = 16;

/// Size of the GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Expand a 32-bit counter into a GCM nonce.
fn expand_nonce(nonce: u32) -> [u8; NONCE_LEN] {
    let mut out = [0u8; NONCE_LEN];
    out[NONCE_LEN - 4..].copy_from_slice(&nonce.to_be_bytes());
    out
}

/// Encrypt `plaintext` under an AES-128 or AES-256 `key`.
///
/// Returns ciphertext followed by the tag (`plaintext.len() + 16` bytes).
pub fn aes_gcm_encrypt(key: &[u8], nonce: u32, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = expand_nonce(nonce);
    let nonce = Nonce::from_slice(&nonce);
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    let sealed = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| VaultError::Provider(format!("invalid key length: {e}")))?
            .encrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| VaultError::Provider(format!("invalid key length: {e}")))?
            .encrypt(nonce, payload),
        other => {
            return Err(VaultError::Provider(format!(
                "AES-GCM key must be 16 or 32 bytes, got {other}"
            )))
        }
    };

    sealed.map_err(|e| VaultError::Provider(format!("encryption error: {e}")))
}

/// Decrypt and verify data produced by `aes_gcm_encrypt`.
///
/// Either the whole plaintext is returned or nothing is; a tag mismatch
/// yields `AuthenticationFailed`.
pub fn aes_gcm_decrypt(key: &[u8], nonce: u32, aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    // A sealed buffer always carries at least the tag.
    if sealed.len() < AES_GCM_TAG_LEN {
        return Err(VaultError::InvalidArgument(format!(
            "ciphertext must be at least {AES_GCM_TAG_LEN} bytes, got {}",
            sealed.len()
        )));
    }

    let nonce = expand_nonce(nonce);
    let nonce = Nonce::from_slice(&nonce);
    let payload = Payload { msg: sealed, aad };

    let opened = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| VaultError::Provider(format!("invalid key length: {e}")))?
            .decrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| VaultError::Provider(format!("invalid key length: {e}")))?
            .decrypt(nonce, payload),
        other => {
            return Err(VaultError::Provider(format!(
                "AES-GCM key must be 16 or 32 bytes, got {other}"
            )))
        }
    };

    opened.map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_right_aligned_big_endian() {
        assert_eq!(
            expand_nonce(0x0102_0304),
            [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn tag_only_input_decrypts_to_empty() {
        let key = [9u8; 32];
        let sealed = aes_gcm_encrypt(&key, 1, b"ad", b"").unwrap();
        assert_eq!(sealed.len(), AES_GCM_TAG_LEN);
        assert!(aes_gcm_decrypt(&key, 1, b"ad", &sealed).unwrap().is_empty());
    }

    #[test]
    fn wrong_nonce_fails() {
        let key = [9u8; 16];
        let sealed = aes_gcm_encrypt(&key, 1, b"", b"hello").unwrap();
        let err = aes_gcm_decrypt(&key, 2, b"", &sealed).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailed));
    }

    #[test]
    fn truncated_input_is_an_argument_error() {
        let err = aes_gcm_decrypt(&[0u8; 32], 0, b"", &[0u8; 15]).unwrap_err();
        assert!(matches!(err, VaultError::InvalidArgument(_)));
    }
}
