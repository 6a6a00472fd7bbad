//! Elliptic-curve Diffie-Hellman over X25519 and P-256.
//!
//! Private keys are handled as raw 32-byte scalars.  X25519 public keys
//! are 32 bytes; P-256 public keys are SEC1 points, reported in
//! uncompressed form (65 bytes) and accepted compressed or uncompressed.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use super::random::{self, EntropySource};
use crate::errors::{Result, VaultError};

/// Length of an X25519 private or public key.
pub const X25519_KEY_LEN: usize = 32;

/// Length of a P-256 private scalar.
pub const P256_SCALAR_LEN: usize = 32;

/// Length of an uncompressed SEC1 P-256 point.
pub const P256_PUBLIC_KEY_LEN: usize = 65;

/// Length of a compressed SEC1 P-256 point.
const P256_COMPRESSED_LEN: usize = 33;

/// Length of the shared secret produced by either curve.
pub const SHARED_SECRET_LEN: usize = 32;

/// Rejection-sampling attempts before giving up on a P-256 scalar.
const P256_KEYGEN_ATTEMPTS: usize = 16;

// ---------------------------------------------------------------------------
// X25519
// ---------------------------------------------------------------------------

fn x25519_secret(private: &[u8]) -> Result<StaticSecret> {
    let mut bytes: [u8; X25519_KEY_LEN] = private.try_into().map_err(|_| {
        VaultError::InvalidSecretMaterial(format!(
            "X25519 private key must be {X25519_KEY_LEN} bytes, got {}",
            private.len()
        ))
    })?;
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();
    Ok(secret)
}

/// Generate a fresh X25519 private key.
pub fn generate_x25519(source: &mut dyn EntropySource) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(vec![0u8; X25519_KEY_LEN]);
    random::fill(source, &mut key)?;
    Ok(key)
}

/// Derive the X25519 public key for `private`.
pub fn x25519_public_key(private: &[u8]) -> Result<Vec<u8>> {
    let secret = x25519_secret(private)?;
    Ok(X25519PublicKey::from(&secret).as_bytes().to_vec())
}

/// Compute the X25519 shared secret between `private` and `peer`.
///
/// Fails if the peer key is not 32 bytes, or if it is a low-order point
/// that would force an all-zero shared secret.
pub fn x25519_agree(private: &[u8], peer: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let peer: [u8; X25519_KEY_LEN] = peer.try_into().map_err(|_| {
        VaultError::InvalidPublicKey(format!(
            "X25519 public key must be {X25519_KEY_LEN} bytes, got {}",
            peer.len()
        ))
    })?;

    let secret = x25519_secret(private)?;
    let shared = secret.diffie_hellman(&X25519PublicKey::from(peer));

    if !shared.was_contributory() {
        return Err(VaultError::Provider(
            "X25519 peer key is a low-order point".into(),
        ));
    }

    Ok(Zeroizing::new(shared.as_bytes().to_vec()))
}

// ---------------------------------------------------------------------------
// P-256
// ---------------------------------------------------------------------------

fn p256_secret(private: &[u8]) -> Result<p256::SecretKey> {
    if private.len() != P256_SCALAR_LEN {
        return Err(VaultError::InvalidSecretMaterial(format!(
            "P-256 private key must be {P256_SCALAR_LEN} bytes, got {}",
            private.len()
        )));
    }
    p256::SecretKey::from_slice(private).map_err(|_| {
        VaultError::InvalidSecretMaterial("P-256 private key is not a valid scalar".into())
    })
}

/// Check that `private` is a usable P-256 scalar (non-zero, below the order).
pub fn validate_p256_private_key(private: &[u8]) -> Result<()> {
    p256_secret(private).map(|_| ())
}

/// Generate a fresh P-256 private scalar by rejection sampling.
pub fn generate_p256(source: &mut dyn EntropySource) -> Result<Zeroizing<Vec<u8>>> {
    for _ in 0..P256_KEYGEN_ATTEMPTS {
        let mut candidate = Zeroizing::new(vec![0u8; P256_SCALAR_LEN]);
        random::fill(source, &mut candidate)?;
        if p256::SecretKey::from_slice(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(VaultError::Provider(
        "could not sample a valid P-256 scalar".into(),
    ))
}

/// Derive the uncompressed SEC1 public key for `private`.
pub fn p256_public_key(private: &[u8]) -> Result<Vec<u8>> {
    let secret = p256_secret(private)?;
    Ok(secret
        .public_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec())
}

/// Compute the P-256 shared secret (affine x-coordinate) with `peer`.
pub fn p256_agree(private: &[u8], peer: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if peer.len() != P256_PUBLIC_KEY_LEN && peer.len() != P256_COMPRESSED_LEN {
        return Err(VaultError::InvalidPublicKey(format!(
            "P-256 public key must be a {P256_COMPRESSED_LEN}- or {P256_PUBLIC_KEY_LEN}-byte SEC1 point, got {} bytes",
            peer.len()
        )));
    }

    let peer = p256::PublicKey::from_sec1_bytes(peer)
        .map_err(|_| VaultError::Provider("peer key is not a point on P-256".into()))?;
    let secret = p256_secret(private)?;

    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}
