//! `secretvault random`: print CSPRNG output as hex.

use crate::cli::output;
use crate::errors::Result;
use crate::vault::Vault;

/// Execute the `random` command. No vault file is needed.
pub fn execute(count: usize) -> Result<()> {
    let vault = Vault::default_init()?;
    output::print_hex(&vault.random_bytes(count)?);
    vault.deinit()
}
