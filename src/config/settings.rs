use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.secretvault.toml`.
///
/// Every field has a default, so no config file is needed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the vault file and audit log.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// File name of the vault inside `vault_dir`.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// `tracing` filter used when `SECRETVAULT_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Record CLI operations in `<vault_dir>/audit.db`.
    #[serde(default = "default_audit_log")]
    pub audit_log: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".secretvault".to_string()
}

fn default_vault_file() -> String {
    "vault.svlt".to_string()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_audit_log() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            vault_file: default_vault_file(),
            log_filter: default_log_filter(),
            audit_log: default_audit_log(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".secretvault.toml";

    /// Load settings from `<project_dir>/.secretvault.toml`.
    ///
    /// A missing file yields defaults; an unparsable one is an error.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.vault_file.is_empty() {
            return Err(VaultError::ConfigError(format!(
                "{}: vault_file cannot be empty",
                config_path.display()
            )));
        }

        Ok(settings)
    }

    /// Directory holding the vault file and audit log.
    pub fn vault_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Full path to the vault file.
    ///
    /// Example: `project_dir/.secretvault/vault.svlt`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_dir_path(project_dir).join(&self.vault_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert_eq!(s.vault_dir, ".secretvault");
        assert_eq!(s.vault_file, "vault.svlt");
        assert_eq!(s.log_filter, "warn");
        assert!(s.audit_log);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "vault.svlt");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_dir = "keys"
vault_file = "team.svlt"
log_filter = "secretvault=debug"
audit_log = false
"#;
        fs::write(tmp.path().join(Settings::FILE_NAME), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "keys");
        assert_eq!(settings.vault_file, "team.svlt");
        assert_eq!(settings.log_filter, "secretvault=debug");
        assert!(!settings.audit_log);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "audit_log = false\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert!(!settings.audit_log);
        assert_eq!(settings.vault_dir, ".secretvault");
        assert_eq!(settings.log_filter, "warn");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_empty_vault_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "vault_file = \"\"\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(VaultError::ConfigError(_))
        ));
    }

    #[test]
    fn vault_path_respects_custom_dir_and_file() {
        let s = Settings {
            vault_dir: "keys".to_string(),
            vault_file: "ci.svlt".to_string(),
            ..Settings::default()
        };
        let project = Path::new("/home/user/myproject");
        assert_eq!(
            s.vault_path(project),
            PathBuf::from("/home/user/myproject/keys/ci.svlt")
        );
    }
}
