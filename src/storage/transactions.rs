//! Transaction repository for JSON storage
//!
//! Manages loading and saving transaction rows to transactions.json.
//! Split transactions are stored flat (parent row + child rows), so the
//! repository keeps a parent index alongside the account index.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::TallyError;
use crate::models::{AccountId, Transaction, TransactionId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: account_id -> transaction_ids
    by_account: RwLock<HashMap<AccountId, Vec<TransactionId>>>,
    /// Index: parent_id -> child transaction_ids
    by_parent: RwLock<HashMap<TransactionId, Vec<TransactionId>>>,
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_account: RwLock::new(HashMap::new()),
            by_parent: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build indexes
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_account = self.by_account.write().map_err(lock_poisoned)?;
        let mut by_parent = self.by_parent.write().map_err(lock_poisoned)?;

        data.clear();
        by_account.clear();
        by_parent.clear();

        for txn in file_data.transactions {
            let id = txn.id;

            by_account.entry(txn.account_id).or_default().push(id);
            if let Some(parent_id) = txn.parent_id {
                by_parent.entry(parent_id).or_default().push(id);
            }

            data.insert(id, txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(a.sort_order.cmp(&b.sort_order))
                .then(b.created_at.cmp(&a.created_at))
        });

        let file_data = TransactionData { transactions };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a transaction by ID (tombstoned rows included)
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all rows, dead or alive
    pub fn get_all(&self) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    /// Get all live rows
    pub fn get_live(&self) -> Result<Vec<Transaction>, TallyError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.is_live())
            .collect())
    }

    /// Get live transactions for an account
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let by_account = self.by_account.read().map_err(lock_poisoned)?;

        let ids = by_account
            .get(&account_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids
            .iter()
            .filter_map(|id| data.get(id))
            .filter(|t| t.is_live())
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    /// Get the children of a split parent (tombstoned children included),
    /// ordered by their position within the split
    pub fn get_children(&self, parent_id: TransactionId) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let by_parent = self.by_parent.read().map_err(lock_poisoned)?;

        let ids = by_parent
            .get(&parent_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut children: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        children.sort_by_key(|c| c.sort_order);
        Ok(children)
    }

    /// Get live transactions in a date range
    pub fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, TallyError> {
        Ok(self
            .get_live()?
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect())
    }

    /// Insert or update a transaction row
    pub fn upsert(&self, txn: Transaction) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_account = self.by_account.write().map_err(lock_poisoned)?;
        let mut by_parent = self.by_parent.write().map_err(lock_poisoned)?;

        // Remove from old indexes if updating
        if let Some(old) = data.get(&txn.id) {
            if let Some(ids) = by_account.get_mut(&old.account_id) {
                ids.retain(|&id| id != txn.id);
            }
            if let Some(parent_id) = old.parent_id {
                if let Some(ids) = by_parent.get_mut(&parent_id) {
                    ids.retain(|&id| id != txn.id);
                }
            }
        }

        // Add to new indexes
        by_account.entry(txn.account_id).or_default().push(txn.id);
        if let Some(parent_id) = txn.parent_id {
            by_parent.entry(parent_id).or_default().push(txn.id);
        }

        data.insert(txn.id, txn);
        Ok(())
    }

    /// Remove a row entirely
    ///
    /// Normal deletion goes through the tombstone flag; physical removal is
    /// only used by restore and compaction paths.
    pub fn remove(&self, id: TransactionId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_account = self.by_account.write().map_err(lock_poisoned)?;
        let mut by_parent = self.by_parent.write().map_err(lock_poisoned)?;

        if let Some(txn) = data.remove(&id) {
            if let Some(ids) = by_account.get_mut(&txn.account_id) {
                ids.retain(|&tid| tid != id);
            }
            if let Some(parent_id) = txn.parent_id {
                if let Some(ids) = by_parent.get_mut(&parent_id) {
                    ids.retain(|&tid| tid != id);
                }
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Find a live transaction by import ID
    pub fn find_by_import_id(&self, import_id: &str) -> Result<Option<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        Ok(data
            .values()
            .find(|t| t.is_live() && t.import_id.as_deref() == Some(import_id))
            .cloned())
    }

    /// Count all rows, dead or alive
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let repo = TransactionRepository::new(path);
        (temp_dir, repo)
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-5000));
        let id = txn.id;
        repo.upsert(txn).unwrap();

        let retrieved = repo.get(id).unwrap().unwrap();
        assert_eq!(retrieved.amount.cents(), -5000);
    }

    #[test]
    fn test_children_index() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let mut parent = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-10000));
        parent.is_parent = true;
        let c1 = Transaction::new_child(&parent, Money::from_cents(-6000), 0);
        let c2 = Transaction::new_child(&parent, Money::from_cents(-4000), 1);
        let parent_id = parent.id;

        repo.upsert(parent).unwrap();
        repo.upsert(c2).unwrap();
        repo.upsert(c1).unwrap();

        let children = repo.get_children(parent_id).unwrap();
        assert_eq!(children.len(), 2);
        // Ordered by sort_order regardless of insertion order
        assert_eq!(children[0].amount.cents(), -6000);
        assert_eq!(children[1].amount.cents(), -4000);
    }

    #[test]
    fn test_tombstoned_rows_hidden_from_account_listing() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let account_id = AccountId::new();
        let mut dead = Transaction::new(account_id, test_date(), Money::from_cents(-100));
        dead.tombstone = true;
        let live = Transaction::new(account_id, test_date(), Money::from_cents(-200));
        let dead_id = dead.id;

        repo.upsert(dead).unwrap();
        repo.upsert(live).unwrap();

        let listed = repo.get_by_account(account_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount.cents(), -200);

        // But the dead row is still reachable directly
        assert!(repo.get(dead_id).unwrap().unwrap().tombstone);
        assert_eq!(repo.get_all().unwrap().len(), 2);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let mut parent = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-1000));
        parent.is_parent = true;
        let child = Transaction::new_child(&parent, Money::from_cents(-1000), 0);
        let parent_id = parent.id;

        repo.upsert(parent).unwrap();
        repo.upsert(child).unwrap();
        repo.save().unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.count().unwrap(), 2);
        assert_eq!(repo2.get_children(parent_id).unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-5000));
        let id = txn.id;
        repo.upsert(txn).unwrap();

        assert!(repo.remove(id).unwrap());
        assert!(!repo.remove(id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
