use std::path::PathBuf;
use thiserror::Error;

use crate::vault::SecretType;

/// All errors that can occur in the vault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Argument errors ---
    #[error("Invalid secret attributes: {0}")]
    InvalidAttributes(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid secret material: {0}")]
    InvalidSecretMaterial(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Secret is {len} bytes, larger than the {max}-byte export limit")]
    ExportTooLarge { len: usize, max: usize },

    // --- Handle errors ---
    #[error("Vault handle {0} is not open")]
    InvalidVaultHandle(u64),

    #[error("Secret handle {0} not found")]
    SecretNotFound(u64),

    // --- Type mismatch ---
    #[error("Secret has type '{actual}', operation requires {expected}")]
    WrongSecretType {
        expected: &'static str,
        actual: SecretType,
    },

    // --- Provider and backend errors ---
    #[error("Failed to initialize vault backend at {path}: {reason}")]
    BackendInitFailed { path: PathBuf, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Crypto provider error: {0}")]
    Provider(String),

    #[error("Authentication failed: ciphertext does not verify under this key, nonce and associated data")]
    AuthenticationFailed,

    #[error("Secret store exhausted: no free handles remain")]
    ResourceExhausted,

    #[error("Vault lock poisoned by a panicking thread")]
    LockPoisoned,

    // --- Host errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Audit error: {0}")]
    AuditError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Coarse classification of a [`VaultError`].
///
/// Lets callers tell "wrong secret" (`Handle`) apart from "wrong kind of
/// secret" (`TypeMismatch`) without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed, missing or out-of-range input. No state was changed.
    Argument,
    /// Unknown vault or secret handle.
    Handle,
    /// The secret exists but its type does not fit the operation.
    TypeMismatch,
    /// Crypto provider or storage backend failure.
    Backend,
    /// Failures of the surrounding host: files, config, CLI.
    Host,
}

impl VaultError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAttributes(_)
            | Self::InvalidArgument(_)
            | Self::InvalidSecretMaterial(_)
            | Self::InvalidPublicKey(_)
            | Self::ExportTooLarge { .. } => ErrorCategory::Argument,
            Self::InvalidVaultHandle(_) | Self::SecretNotFound(_) => ErrorCategory::Handle,
            Self::WrongSecretType { .. } => ErrorCategory::TypeMismatch,
            Self::BackendInitFailed { .. }
            | Self::Backend(_)
            | Self::Provider(_)
            | Self::AuthenticationFailed
            | Self::ResourceExhausted
            | Self::LockPoisoned => ErrorCategory::Backend,
            Self::Io(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_)
            | Self::AuditError(_)
            | Self::CommandFailed(_) => ErrorCategory::Host,
        }
    }

    /// `true` for unknown vault and secret handles.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::Handle
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_separate_handle_from_type_errors() {
        assert_eq!(
            VaultError::SecretNotFound(7).category(),
            ErrorCategory::Handle
        );
        assert_eq!(
            VaultError::WrongSecretType {
                expected: "an AES key",
                actual: SecretType::Buffer,
            }
            .category(),
            ErrorCategory::TypeMismatch
        );
        assert_eq!(
            VaultError::InvalidAttributes("x".into()).category(),
            ErrorCategory::Argument
        );
        assert_eq!(
            VaultError::AuthenticationFailed.category(),
            ErrorCategory::Backend
        );
    }

    #[test]
    fn diagnostics_are_human_readable() {
        let err = VaultError::WrongSecretType {
            expected: "an AES key",
            actual: SecretType::Curve25519PrivateKey,
        };
        assert_eq!(
            err.to_string(),
            "Secret has type 'curve25519', operation requires an AES key"
        );
        assert!(VaultError::InvalidVaultHandle(3).is_not_found());
    }
}
