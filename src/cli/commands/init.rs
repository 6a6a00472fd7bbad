//! `secretvault init`: create a new, empty vault file.

use std::fs;

use crate::cli::{output, record, Context};
use crate::errors::{Result, VaultError};
use crate::vault::Vault;

/// Execute the `init` command.
pub fn execute(ctx: &Context) -> Result<()> {
    // 1. Create the vault directory if it doesn't exist.
    if !ctx.vault_dir.exists() {
        fs::create_dir_all(&ctx.vault_dir)?;
        output::info(&format!(
            "Created vault directory: {}",
            ctx.vault_dir.display()
        ));
    }

    // 2. Refuse to clobber an existing vault.
    if ctx.vault_path.exists() {
        output::tip("Use `secretvault generate` to add secrets to the existing vault.");
        return Err(VaultError::CommandFailed(format!(
            "vault already exists at {}",
            ctx.vault_path.display()
        )));
    }

    // 3. Opening a missing file creates it.
    let vault = Vault::file_init(&ctx.vault_path)?;
    vault.deinit()?;

    output::success(&format!("Vault created at {}", ctx.vault_path.display()));
    record(ctx, "init", None, Some("vault created"));

    output::tip("Run `secretvault generate --type aes256` to add a key.");
    output::tip("Run `secretvault list` to see all secrets.");

    Ok(())
}
