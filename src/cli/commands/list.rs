//! `secretvault list`: display all secrets in a table.

use crate::cli::{output, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let vault = ctx.open_vault()?;
    let secrets = vault.secret_list()?;

    output::info(&format!(
        "{}: {} secret(s)",
        ctx.vault_path.display(),
        secrets.len()
    ));
    output::print_secrets_table(&secrets);

    vault.deinit()
}
