//! Backup manager
//!
//! Backups are single-file JSON archives of every data file, named by
//! timestamp. Restoring writes the archived data files back and leaves
//! reloading to the caller.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::paths::TallyPaths;
use crate::config::settings::BackupRetention;
use crate::error::{TallyError, TallyResult};

/// Metadata about a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Backup id (the filename without extension)
    pub id: String,
    /// Full path to the backup file
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Backup archive format
#[derive(Debug, Serialize, Deserialize)]
struct BackupArchive {
    /// Schema version for migration support
    schema_version: u32,
    /// When the backup was created
    created_at: DateTime<Utc>,
    /// Data-file contents keyed by file name
    files: std::collections::BTreeMap<String, Value>,
}

/// Manages backup creation, restore and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    paths: TallyPaths,
    retention: BackupRetention,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: TallyPaths, retention: BackupRetention) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            paths,
            retention,
        }
    }

    /// Create a backup of all data files
    ///
    /// Applies the retention policy afterwards.
    pub fn create_backup(&self) -> TallyResult<BackupInfo> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| TallyError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let id = format!(
            "backup-{}-{:03}",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = self.backup_dir.join(format!("{}.json", id));

        let mut files = std::collections::BTreeMap::new();
        for path in self.paths.data_files() {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| TallyError::Io(format!("Bad data file path: {}", path.display())))?
                .to_string();
            files.insert(name, read_json_value(&path)?);
        }

        let archive = BackupArchive {
            schema_version: 1,
            created_at: now,
            files,
        };

        let json = serde_json::to_string_pretty(&archive)
            .map_err(|e| TallyError::Json(format!("Failed to serialize backup: {}", e)))?;
        fs::write(&backup_path, &json)
            .map_err(|e| TallyError::Io(format!("Failed to write backup file: {}", e)))?;

        self.apply_retention()?;

        Ok(BackupInfo {
            id,
            path: backup_path,
            created_at: now,
            size_bytes: json.len() as u64,
        })
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> TallyResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| TallyError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry =
                entry.map_err(|e| TallyError::Io(format!("Failed to read backup entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let Ok(contents) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(archive) = serde_json::from_str::<BackupArchive>(&contents) else {
                continue;
            };

            let id = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            backups.push(BackupInfo {
                id,
                path: path.clone(),
                created_at: archive.created_at,
                size_bytes: contents.len() as u64,
            });
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Restore a backup by id, overwriting the current data files
    ///
    /// The caller reloads storage afterwards.
    pub fn restore(&self, backup_id: &str) -> TallyResult<()> {
        let backup_path = self.backup_dir.join(format!("{}.json", backup_id));
        if !backup_path.exists() {
            return Err(TallyError::NotFound {
                entity_type: "Backup",
                identifier: backup_id.to_string(),
            });
        }

        let contents = fs::read_to_string(&backup_path)
            .map_err(|e| TallyError::Io(format!("Failed to read backup: {}", e)))?;
        let archive: BackupArchive = serde_json::from_str(&contents)
            .map_err(|e| TallyError::Json(format!("Corrupt backup file: {}", e)))?;

        for (name, value) in &archive.files {
            let target = self.paths.data_dir().join(name);
            crate::storage::write_json_atomic(&target, value)?;
        }

        Ok(())
    }

    /// Drop the oldest backups beyond the retention count
    fn apply_retention(&self) -> TallyResult<()> {
        let backups = self.list_backups()?;
        for stale in backups.iter().skip(self.retention.keep_count as usize) {
            let _ = fs::remove_file(&stale.path);
        }
        Ok(())
    }
}

/// Read a data file as a raw JSON value (empty object when missing)
fn read_json_value(path: &std::path::Path) -> TallyResult<Value> {
    if !path.exists() {
        return Ok(Value::Object(Default::default()));
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| TallyError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| TallyError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Transaction};
    use crate::storage::Storage;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TallyPaths, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        storage.load_all().unwrap();
        (temp_dir, paths, storage)
    }

    fn insert_txn(storage: &Storage) {
        let account = crate::models::Account::new("Checking");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();
        storage
            .transactions
            .upsert(Transaction::new(
                account_id,
                NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                Money::from_cents(-100),
            ))
            .unwrap();
        storage.save_all().unwrap();
    }

    #[test]
    fn test_create_and_list() {
        let (_temp_dir, paths, storage) = setup();
        insert_txn(&storage);

        let manager = BackupManager::new(paths, BackupRetention::default());
        let info = manager.create_backup().unwrap();
        assert!(info.path.exists());

        let listed = manager.list_backups().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, info.id);
    }

    #[test]
    fn test_restore_round_trip() {
        let (_temp_dir, paths, storage) = setup();
        insert_txn(&storage);

        let manager = BackupManager::new(paths, BackupRetention::default());
        let info = manager.create_backup().unwrap();

        // Wreck the live data
        storage.transactions.get_all().unwrap().iter().for_each(|t| {
            storage.transactions.remove(t.id).unwrap();
        });
        storage.save_all().unwrap();
        storage.load_all().unwrap();
        assert_eq!(storage.transactions.count().unwrap(), 0);

        // Restore and reload
        manager.restore(&info.id).unwrap();
        storage.load_all().unwrap();
        assert_eq!(storage.transactions.count().unwrap(), 1);
    }

    #[test]
    fn test_restore_unknown_id() {
        let (_temp_dir, paths, _storage) = setup();
        let manager = BackupManager::new(paths, BackupRetention::default());
        assert!(manager.restore("backup-nope").is_err());
    }

    #[test]
    fn test_retention_drops_oldest() {
        let (_temp_dir, paths, storage) = setup();
        insert_txn(&storage);

        let manager = BackupManager::new(paths, BackupRetention { keep_count: 2 });
        for _ in 0..4 {
            manager.create_backup().unwrap();
            // Distinct timestamps so ordering is stable
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(manager.list_backups().unwrap().len(), 2);
    }
}
