//! `secretvault generate`: create a secret from fresh randomness.

use crate::cli::{index_of, output, parse_attributes, record, Context};
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(
    ctx: &Context,
    secret_type: &str,
    persistence: &str,
    length: Option<usize>,
) -> Result<()> {
    let attributes = parse_attributes(secret_type, persistence, length)?;
    let vault = ctx.open_vault()?;

    let handle = vault.secret_generate(attributes)?;
    let index = index_of(&vault, handle)?;
    let summary = format!(
        "{} {} ({} bytes)",
        attributes.persistence(),
        attributes.secret_type(),
        attributes.length()
    );

    match (attributes.is_persistent(), index) {
        (true, Some(index)) => {
            output::success(&format!("Generated {summary} at index {index}"));
            record(ctx, "generate", Some(&index.to_string()), Some(&summary));
        }
        _ => {
            output::success(&format!("Generated {summary}"));
            output::warning("Ephemeral secrets are discarded when this command exits.");
        }
    }

    vault.deinit()
}
