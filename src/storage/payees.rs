//! Payee repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Payee, PayeeId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable payee data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PayeeData {
    payees: Vec<Payee>,
}

/// Repository for payee persistence
pub struct PayeeRepository {
    path: PathBuf,
    data: RwLock<HashMap<PayeeId, Payee>>,
}

impl PayeeRepository {
    /// Create a new payee repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load payees from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: PayeeData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.clear();
        for payee in file_data.payees {
            data.insert(payee.id, payee);
        }

        Ok(())
    }

    /// Save payees to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut payees: Vec<_> = data.values().cloned().collect();
        payees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        write_json_atomic(&self.path, &PayeeData { payees })
    }

    /// Get a payee by ID
    pub fn get(&self, id: PayeeId) -> Result<Option<Payee>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Get a payee by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Payee>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    /// Get an existing payee by name or create a new one
    pub fn get_or_create(&self, name: &str) -> Result<Payee, TallyError> {
        if let Some(payee) = self.get_by_name(name)? {
            return Ok(payee);
        }

        let payee = Payee::new(name.trim());
        payee
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.insert(payee.id, payee.clone());
        Ok(payee)
    }

    /// Get all payees, sorted by name
    pub fn get_all(&self) -> Result<Vec<Payee>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut payees: Vec<_> = data.values().cloned().collect();
        payees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(payees)
    }

    /// Insert or update a payee
    pub fn upsert(&self, payee: Payee) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.insert(payee.id, payee);
        Ok(())
    }

    /// Delete a payee
    pub fn delete(&self, id: PayeeId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        Ok(data.remove(&id).is_some())
    }

    /// Count payees
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PayeeRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = PayeeRepository::new(temp_dir.path().join("payees.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_get_or_create() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let first = repo.get_or_create("Corner Store").unwrap();
        let second = repo.get_or_create("corner store").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_get_or_create_rejects_empty() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        assert!(repo.get_or_create("   ").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        repo.get_or_create("Corner Store").unwrap();
        repo.save().unwrap();

        let repo2 = PayeeRepository::new(temp_dir.path().join("payees.json"));
        repo2.load().unwrap();
        assert!(repo2.get_by_name("Corner Store").unwrap().is_some());
    }
}
