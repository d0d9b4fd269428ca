//! User settings for Tally
//!
//! Manages preferences including encryption settings and backup retention.

use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::TallyError;
use crate::storage::file_io::{read_json, write_json_atomic};

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of backups to keep
    pub keep_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep_count: 30 }
    }
}

/// End-to-end encryption key settings
///
/// `key-make` stores the derivation parameters plus a small test blob
/// encrypted with the derived key; `key-test` checks a password by trying
/// to decrypt the blob.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EncryptionSettings {
    /// Whether an encryption key has been created
    #[serde(default)]
    pub enabled: bool,

    /// Key derivation parameters (salt, memory cost, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_params: Option<KeyDerivationParams>,

    /// Base64 nonce + ciphertext of the verification blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_blob: Option<String>,
}

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Display name of the budget file
    #[serde(default = "default_budget_name")]
    pub budget_name: String,

    /// Encryption key settings
    #[serde(default)]
    pub encryption: EncryptionSettings,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,
}

fn default_schema_version() -> u32 {
    1
}

fn default_budget_name() -> String {
    "My Budget".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            budget_name: default_budget_name(),
            encryption: EncryptionSettings::default(),
            backup_retention: BackupRetention::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, creating defaults if the file is missing
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        if paths.settings_file().exists() {
            read_json(paths.settings_file())
        } else {
            let settings = Self::default();
            paths.ensure_directories()?;
            settings.save(paths)?;
            Ok(settings)
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        write_json_atomic(paths.settings_file(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.budget_name, "My Budget");
        assert!(paths.settings_file().exists());

        // Reload round-trips
        let reloaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(reloaded.budget_name, settings.budget_name);
    }

    #[test]
    fn test_encryption_settings_default_off() {
        let settings = Settings::default();
        assert!(!settings.encryption.enabled);
        assert!(settings.encryption.key_params.is_none());
    }
}
