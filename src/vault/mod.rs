//! Vault module: handle-based secret storage and operations.
//!
//! This module provides:
//! - Secret attributes and the descriptor codec (`attributes`)
//! - Secret handles and records (`secret`)
//! - The handle-indexed secret arena (`store`)
//! - Storage backends and the vault file format (`backend`, `format`)
//! - The `Vault` instance and its operations (`instance`, `ops`)

pub mod attributes;
pub mod backend;
pub mod format;
pub mod instance;
pub mod ops;
pub mod secret;
pub mod store;

// Re-export the most commonly used items.
pub use attributes::{
    SecretAttributes, SecretPersistence, SecretPurpose, SecretType, MAX_BUFFER_SECRET_LEN,
};
pub use backend::{Backend, FileBackend, MemoryBackend};
pub use instance::Vault;
pub use ops::{
    DerivedOutputCount, HkdfOutputCount, DERIVED_SECRET_LEN, MAX_DERIVED_OUTPUT_COUNT,
    MAX_PUBLIC_KEY_SIZE, MAX_RANDOM_BYTES, MAX_SECRET_EXPORT_SIZE,
};
pub use secret::{SecretHandle, SecretMetadata};
pub use store::SecretStore;
