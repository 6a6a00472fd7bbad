//! SecretVault: a handle-based vault for key material.
//!
//! Callers never see raw secrets unless they export them. A [`vault::Vault`]
//! owns an arena of secrets addressed by opaque handles and runs random,
//! hash, ECDH, HKDF and AES-GCM operations over them. The
//! [`registry::VaultRegistry`] exposes the same operations over integer
//! vault handles and JSON attribute descriptors.

#[cfg(feature = "audit-log")]
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod registry;
pub mod vault;

pub use errors::{ErrorCategory, Result, VaultError};
pub use registry::{VaultHandle, VaultRegistry};
pub use vault::{SecretAttributes, SecretHandle, Vault};
