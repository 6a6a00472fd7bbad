//! One module per `secretvault` subcommand.

#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod destroy;
pub mod export;
pub mod generate;
pub mod hash;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod pubkey;
pub mod random;
pub mod version;
