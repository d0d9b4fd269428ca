//! Budget allocation repository for JSON storage
//!
//! Allocations are keyed by (month, category).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{BudgetAllocation, BudgetMonth, CategoryId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable allocation data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AllocationData {
    allocations: Vec<BudgetAllocation>,
}

/// Repository for budget allocation persistence
pub struct BudgetRepository {
    path: PathBuf,
    data: RwLock<HashMap<(BudgetMonth, CategoryId), BudgetAllocation>>,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load allocations from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: AllocationData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.clear();
        for allocation in file_data.allocations {
            data.insert((allocation.month, allocation.category_id), allocation);
        }

        Ok(())
    }

    /// Save allocations to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut allocations: Vec<_> = data.values().cloned().collect();
        allocations.sort_by_key(|a| (a.month, a.category_id.to_string()));

        write_json_atomic(&self.path, &AllocationData { allocations })
    }

    /// Get the allocation for a category in a month
    pub fn get(
        &self,
        month: BudgetMonth,
        category_id: CategoryId,
    ) -> Result<Option<BudgetAllocation>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&(month, category_id)).cloned())
    }

    /// Get all allocations for a month
    pub fn get_for_month(&self, month: BudgetMonth) -> Result<Vec<BudgetAllocation>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .values()
            .filter(|a| a.month == month)
            .cloned()
            .collect())
    }

    /// Insert or update an allocation
    pub fn upsert(&self, allocation: BudgetAllocation) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.insert((allocation.month, allocation.category_id), allocation);
        Ok(())
    }

    /// Delete all allocations for a category (used when a category is
    /// deleted)
    pub fn delete_for_category(&self, category_id: CategoryId) -> Result<usize, TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let before = data.len();
        data.retain(|_, a| a.category_id != category_id);
        Ok(before - data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::new(temp_dir.path().join("allocations.json"));
        (temp_dir, repo)
    }

    fn month() -> BudgetMonth {
        BudgetMonth::new(2025, 1).unwrap()
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let category_id = CategoryId::new();
        let mut allocation = BudgetAllocation::new(category_id, month());
        allocation.set_budgeted(Money::from_cents(50000));
        repo.upsert(allocation).unwrap();

        let got = repo.get(month(), category_id).unwrap().unwrap();
        assert_eq!(got.budgeted.cents(), 50000);
        assert_eq!(repo.get_for_month(month()).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_for_category() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let category_id = CategoryId::new();
        repo.upsert(BudgetAllocation::new(category_id, month()))
            .unwrap();
        repo.upsert(BudgetAllocation::new(category_id, month().next()))
            .unwrap();
        repo.upsert(BudgetAllocation::new(CategoryId::new(), month()))
            .unwrap();

        assert_eq!(repo.delete_for_category(category_id).unwrap(), 2);
        assert_eq!(repo.get_for_month(month()).unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        repo.upsert(BudgetAllocation::new(CategoryId::new(), month()))
            .unwrap();
        repo.save().unwrap();

        let repo2 = BudgetRepository::new(temp_dir.path().join("allocations.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get_for_month(month()).unwrap().len(), 1);
    }
}
