//! Account repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Account, AccountId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable account data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AccountData {
    accounts: Vec<Account>,
}

/// Repository for account persistence
pub struct AccountRepository {
    path: PathBuf,
    data: RwLock<HashMap<AccountId, Account>>,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: AccountData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.clear();
        for account in file_data.accounts {
            data.insert(account.id, account);
        }

        Ok(())
    }

    /// Save accounts to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by_key(|a| (a.sort_order, a.name.clone()));

        write_json_atomic(&self.path, &AccountData { accounts })
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> Result<Option<Account>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Account>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .values()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    /// Get all accounts, optionally including closed ones
    pub fn get_all(&self, include_closed: bool) -> Result<Vec<Account>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut accounts: Vec<_> = data
            .values()
            .filter(|a| include_closed || !a.closed)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| (a.sort_order, a.name.clone()));
        Ok(accounts)
    }

    /// Find the account linked to an external bank account, if any
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Account>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .values()
            .find(|a| {
                a.bank_link
                    .as_ref()
                    .is_some_and(|l| l.external_id == external_id)
            })
            .cloned())
    }

    /// Insert or update an account
    pub fn upsert(&self, account: Account) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.insert(account.id, account);
        Ok(())
    }

    /// Count accounts
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankLink, SyncSource};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, AccountRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = AccountRepository::new(temp_dir.path().join("accounts.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account = Account::new("Checking");
        let id = account.id;
        repo.upsert(account).unwrap();

        assert_eq!(repo.get(id).unwrap().unwrap().name, "Checking");
        assert!(repo.get_by_name("checking").unwrap().is_some());
    }

    #[test]
    fn test_closed_accounts_filtered() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let mut closed = Account::new("Old Savings");
        closed.close();
        repo.upsert(closed).unwrap();
        repo.upsert(Account::new("Checking")).unwrap();

        assert_eq!(repo.get_all(false).unwrap().len(), 1);
        assert_eq!(repo.get_all(true).unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_external_id() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let mut account = Account::new("Checking");
        account.link(BankLink {
            sync_source: SyncSource::GoCardless,
            external_id: "ext-1".to_string(),
            requisition_id: "req-1".to_string(),
        });
        repo.upsert(account).unwrap();

        assert!(repo.find_by_external_id("ext-1").unwrap().is_some());
        assert!(repo.find_by_external_id("ext-2").unwrap().is_none());
    }
}
