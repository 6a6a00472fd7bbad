//! `secretvault export`: print a secret's raw material as hex.

use crate::cli::{output, record, resolve_index, Context};
use crate::errors::Result;

/// Execute the `export` command.
pub fn execute(ctx: &Context, index: usize) -> Result<()> {
    let vault = ctx.open_vault()?;
    let secret = resolve_index(&vault, index)?;

    let material = vault.secret_export(secret.handle)?;
    output::print_hex(&material);

    record(
        ctx,
        "export",
        Some(&index.to_string()),
        Some(secret.attributes.secret_type().as_str()),
    );
    vault.deinit()
}
