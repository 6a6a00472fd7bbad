//! `secretvault pubkey`: print the public half of a private key.
//!
//! X25519 keys print 32 bytes; P-256 keys print the 65-byte uncompressed
//! SEC1 point.

use crate::cli::{output, resolve_index, Context};
use crate::errors::Result;

/// Execute the `pubkey` command.
pub fn execute(ctx: &Context, index: usize) -> Result<()> {
    let vault = ctx.open_vault()?;
    let secret = resolve_index(&vault, index)?;

    let public_key = vault.secret_publickey_get(secret.handle)?;
    output::print_hex(&public_key);

    vault.deinit()
}
