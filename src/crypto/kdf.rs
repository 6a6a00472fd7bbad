//! Key derivation using HKDF-SHA256 (RFC 5869).
//!
//! The vault runs a full extract-then-expand with an empty `info`
//! string: the salt and input keying material both come from vault
//! secrets, and the output is split into consecutive chunks by the
//! caller.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::errors::{Result, VaultError};

/// Largest output HKDF-SHA256 can produce (255 blocks of 32 bytes).
pub const MAX_HKDF_OUTPUT: usize = 255 * 32;

/// Fill `okm` with HKDF-SHA256 output for `salt` and `ikm`.
pub fn hkdf_sha256(salt: &[u8], ikm: &[u8], okm: &mut [u8]) -> Result<()> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    hk.expand(&[], okm)
        .map_err(|e| VaultError::Provider(format!("HKDF expand failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_output() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        hkdf_sha256(b"salt", b"ikm", &mut a).unwrap();
        hkdf_sha256(b"salt", b"ikm", &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_salt_different_output() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        hkdf_sha256(b"salt-a", b"ikm", &mut a).unwrap();
        hkdf_sha256(b"salt-b", b"ikm", &mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn oversized_output_fails() {
        let mut okm = vec![0u8; MAX_HKDF_OUTPUT + 1];
        assert!(hkdf_sha256(b"s", b"k", &mut okm).is_err());
    }
}
