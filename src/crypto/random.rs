//! Entropy sources for random generation and key generation.
//!
//! A vault owns exactly one `EntropySource`.  The default is the OS
//! CSPRNG; `SeededEntropy` gives reproducible output for tests and
//! deterministic replays.

use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};

use crate::errors::{Result, VaultError};

/// A cryptographically secure random source a vault can own.
pub trait EntropySource: RngCore + CryptoRng + Send {}

impl<T: RngCore + CryptoRng + Send> EntropySource for T {}

/// The operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl RngCore for SystemEntropy {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for SystemEntropy {}

/// A seeded ChaCha-based generator.
///
/// Two sources built from the same seed produce the same byte stream.
#[derive(Debug, Clone)]
pub struct SeededEntropy(StdRng);

impl SeededEntropy {
    /// Build from a full 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(StdRng::from_seed(seed))
    }

    /// Build from a short integer seed (expanded internally).
    pub fn from_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RngCore for SeededEntropy {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SeededEntropy {}

/// Fill `dest` from `source`, surfacing generator failures as provider errors.
pub fn fill(source: &mut dyn EntropySource, dest: &mut [u8]) -> Result<()> {
    source
        .try_fill_bytes(dest)
        .map_err(|e| VaultError::Provider(format!("random generation failed: {e}")))
}
