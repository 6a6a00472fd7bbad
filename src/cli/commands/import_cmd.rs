//! `secretvault import`: store caller-supplied key material.
//!
//! Usage:
//!   secretvault import --type aes128 000102030405060708090a0b0c0d0e0f
//!   secretvault import --type buffer 0xdeadbeef

use zeroize::Zeroizing;

use crate::cli::{decode_hex, index_of, output, parse_attributes, record, Context};
use crate::errors::Result;

/// Execute the `import` command.
pub fn execute(
    ctx: &Context,
    secret_type: &str,
    persistence: &str,
    length: Option<usize>,
    material: &str,
) -> Result<()> {
    let material = Zeroizing::new(decode_hex(material)?);
    let attributes = parse_attributes(
        secret_type,
        persistence,
        Some(length.unwrap_or(material.len())),
    )?;
    let vault = ctx.open_vault()?;

    let handle = vault.secret_import(attributes, &material)?;
    let summary = format!("{} {}", attributes.persistence(), attributes.secret_type());

    match index_of(&vault, handle)? {
        Some(index) if attributes.is_persistent() => {
            output::success(&format!("Imported {summary} at index {index}"));
            record(ctx, "import", Some(&index.to_string()), Some(&summary));
        }
        _ => {
            output::success(&format!("Imported {summary}"));
            output::warning("Ephemeral secrets are discarded when this command exits.");
        }
    }

    vault.deinit()
}
