//! `secretvault sha256`: print the SHA-256 digest of a string.

use crate::cli::output;
use crate::errors::Result;
use crate::vault::Vault;

/// Execute the `sha256` command. No vault file is needed.
pub fn execute(text: &str) -> Result<()> {
    let vault = Vault::default_init()?;
    output::print_hex(&vault.sha256(text.as_bytes())?);
    vault.deinit()
}
