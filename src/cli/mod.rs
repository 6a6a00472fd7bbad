//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::{
    SecretAttributes, SecretHandle, SecretMetadata, SecretPersistence, SecretPurpose, SecretType,
    Vault,
};

/// SecretVault CLI: a file-backed vault for key material.
#[derive(Parser)]
#[command(
    name = "secretvault",
    about = "Handle-based vault for keys: generate, import, export and derive",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default from .secretvault.toml, else .secretvault)
    #[arg(long, global = true, env = "SECRETVAULT_DIR")]
    pub vault_dir: Option<String>,

    /// Vault file name inside the vault directory (default: vault.svlt)
    #[arg(long, global = true)]
    pub file: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault file
    Init,

    /// Generate a new secret from the OS CSPRNG
    Generate {
        /// Secret type: buffer, aes128, aes256, curve25519, p256
        #[arg(short = 't', long = "type")]
        secret_type: String,

        /// persistent (default) or ephemeral
        #[arg(short, long, default_value = "persistent")]
        persistence: String,

        /// Length in bytes (required for buffer)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Import raw key material given as hex
    Import {
        /// Secret type: buffer, aes128, aes256, curve25519, p256
        #[arg(short = 't', long = "type")]
        secret_type: String,

        /// persistent (default) or ephemeral
        #[arg(short, long, default_value = "persistent")]
        persistence: String,

        /// Length in bytes (defaults to the decoded material length)
        #[arg(short, long)]
        length: Option<usize>,

        /// Key material as hex
        material: String,
    },

    /// Print a secret's raw material as hex
    Export {
        /// Secret index from `secretvault list`
        index: usize,
    },

    /// Print the public key of a private-key secret as hex
    Pubkey {
        /// Secret index from `secretvault list`
        index: usize,
    },

    /// List all secrets in the vault
    List,

    /// Destroy a secret, removing it from the vault file
    Destroy {
        /// Secret index from `secretvault list`
        index: usize,
    },

    /// Print random bytes as hex
    Random {
        /// Number of bytes
        count: usize,
    },

    /// Print the SHA-256 digest of a string as hex
    Sha256 {
        /// Input text
        text: String,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// Show version information
    Version,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved locations and settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub vault_dir: PathBuf,
    pub vault_path: PathBuf,
}

impl Context {
    /// Combine `.secretvault.toml` in the current directory with CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut settings = Settings::load(&cwd)?;

        if let Some(dir) = &cli.vault_dir {
            settings.vault_dir = dir.clone();
        }
        if let Some(file) = &cli.file {
            validate_file_name(file)?;
            settings.vault_file = file.clone();
        }

        Ok(Self {
            vault_dir: settings.vault_dir_path(&cwd),
            vault_path: settings.vault_path(&cwd),
            settings,
        })
    }

    /// Open the existing vault file.
    pub fn open_vault(&self) -> Result<Vault> {
        if !self.vault_path.exists() {
            output::tip("Run `secretvault init` to create a vault.");
            return Err(VaultError::CommandFailed(format!(
                "no vault found at {}",
                self.vault_path.display()
            )));
        }
        Vault::file_init(&self.vault_path)
    }
}

/// Record an operation in the audit log when the feature is compiled in.
pub fn record(ctx: &Context, op: &str, secret: Option<&str>, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(ctx, op, secret, details);

    #[cfg(not(feature = "audit-log"))]
    let _ = (ctx, op, secret, details);
}

/// Map a `list` index to the secret's handle in this session.
pub fn resolve_index(vault: &Vault, index: usize) -> Result<SecretMetadata> {
    let mut secrets = vault.secret_list()?;
    if index >= secrets.len() {
        return Err(VaultError::CommandFailed(format!(
            "no secret at index {index} (vault holds {})",
            secrets.len()
        )));
    }
    Ok(secrets.swap_remove(index))
}

/// Position of `handle` in `list` output, if it is still live.
pub fn index_of(vault: &Vault, handle: SecretHandle) -> Result<Option<usize>> {
    Ok(vault
        .secret_list()?
        .iter()
        .position(|meta| meta.handle == handle))
}

/// Build attributes from the `--type`, `--persistence` and `--length` flags.
///
/// Fixed-size types derive their length when `--length` is omitted.
pub fn parse_attributes(
    secret_type: &str,
    persistence: &str,
    length: Option<usize>,
) -> Result<SecretAttributes> {
    let secret_type: SecretType = secret_type.parse()?;
    let persistence: SecretPersistence = persistence.parse()?;

    SecretAttributes::new(
        secret_type,
        persistence,
        SecretPurpose::KeyAgreement,
        length.unwrap_or(0),
    )
}

/// Decode hex input, tolerating surrounding whitespace and a `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| VaultError::InvalidArgument(format!("invalid hex: {e}")))
}

/// Vault file names must stay inside the vault directory.
fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
        return Err(VaultError::ConfigError(format!(
            "vault file name '{name}' must be a plain file name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_attributes_for_keys_derives_length() {
        let attrs = parse_attributes("aes256", "persistent", None).unwrap();
        assert_eq!(attrs.secret_type(), SecretType::Aes256Key);
        assert_eq!(attrs.length(), 32);
        assert!(attrs.is_persistent());

        assert!(parse_attributes("aes128", "ephemeral", Some(16)).is_ok());
        assert!(parse_attributes("aes128", "ephemeral", Some(17)).is_err());
    }

    #[test]
    fn parse_attributes_requires_buffer_length() {
        assert!(parse_attributes("buffer", "ephemeral", None).is_err());
        let attrs = parse_attributes("buffer", "ephemeral", Some(40)).unwrap();
        assert_eq!(attrs.length(), 40);
    }

    #[test]
    fn parse_attributes_rejects_unknown_names() {
        assert!(parse_attributes("rsa", "persistent", None).is_err());
        assert!(parse_attributes("aes128", "forever", None).is_err());
    }

    #[test]
    fn decode_hex_accepts_prefix_and_whitespace() {
        assert_eq!(decode_hex(" 0x0aff\n").unwrap(), vec![0x0a, 0xff]);
        assert!(decode_hex("zz").is_err());
        assert!(decode_hex("abc").is_err());
    }

    #[test]
    fn file_names_cannot_escape_vault_dir() {
        assert!(validate_file_name("team.svlt").is_ok());
        assert!(validate_file_name("../x.svlt").is_err());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
    }
}
