//! `secretvault version`: display version and build features.

use console::style;

use crate::errors::Result;
use crate::vault::{
    MAX_BUFFER_SECRET_LEN, MAX_DERIVED_OUTPUT_COUNT, MAX_RANDOM_BYTES, MAX_SECRET_EXPORT_SIZE,
};

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("secretvault {}", env!("CARGO_PKG_VERSION"));

    let audit = if cfg!(feature = "audit-log") {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("  audit log:           {audit}");
    println!("  max export size:     {MAX_SECRET_EXPORT_SIZE} bytes");
    println!("  max HKDF outputs:    {MAX_DERIVED_OUTPUT_COUNT}");
    println!("  max buffer secret:   {MAX_BUFFER_SECRET_LEN} bytes");
    println!("  max random request:  {MAX_RANDOM_BYTES} bytes");

    Ok(())
}
