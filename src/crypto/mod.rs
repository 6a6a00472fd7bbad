//! Primitive crypto provider for the vault.
//!
//! This module provides pure functions over byte slices:
//! - SHA-256 digests (`hash`)
//! - Entropy sources and random generation (`random`)
//! - X25519 and P-256 key agreement (`ecdh`)
//! - HKDF-SHA256 derivation (`kdf`)
//! - AES-GCM authenticated encryption (`encryption`)
//!
//! Nothing here knows about handles or attributes; the vault resolves
//! secrets first and hands raw material to these functions.

pub mod ecdh;
pub mod encryption;
pub mod hash;
pub mod kdf;
pub mod random;

pub use encryption::{aes_gcm_decrypt, aes_gcm_encrypt, AES_GCM_TAG_LEN};
pub use hash::{sha256, SHA256_LEN};
pub use kdf::hkdf_sha256;
pub use random::{EntropySource, SeededEntropy, SystemEntropy};
