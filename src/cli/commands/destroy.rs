//! `secretvault destroy`: remove a secret from the vault file.

use crate::cli::{output, record, resolve_index, Context};
use crate::errors::Result;

/// Execute the `destroy` command.
pub fn execute(ctx: &Context, index: usize) -> Result<()> {
    let vault = ctx.open_vault()?;
    let secret = resolve_index(&vault, index)?;

    vault.secret_destroy(secret.handle)?;
    output::success(&format!(
        "Destroyed {} secret at index {index}",
        secret.attributes.secret_type()
    ));
    output::tip("Indexes of later secrets shift down by one.");

    record(
        ctx,
        "destroy",
        Some(&index.to_string()),
        Some(secret.attributes.secret_type().as_str()),
    );
    vault.deinit()
}
