//! Category service
//!
//! Business logic for category groups and categories: CRUD, moves between
//! groups, and deletion with transaction transfer.

use chrono::Utc;
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Category, CategoryGroup, CategoryGroupId, CategoryId};
use crate::storage::Storage;

use super::transaction::TransactionPatch;
use super::TransactionService;

/// A group with its categories, for grouped listings
#[derive(Debug, Clone, Serialize)]
pub struct GroupedCategories {
    #[serde(flatten)]
    pub group: CategoryGroup,
    pub categories: Vec<Category>,
}

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    /// Create a new category service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // ----- groups -----

    /// Create a new category group
    pub fn create_group(&self, name: &str, is_income: bool) -> TallyResult<CategoryGroup> {
        if self.find_group_by_name(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "CategoryGroup",
                identifier: name.to_string(),
            });
        }

        let mut group = CategoryGroup::new(name.trim());
        group.is_income = is_income;
        group.sort_order = self.storage.categories.get_all_groups()?.len() as i32;
        group
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_group(group.clone())?;
        self.storage.categories.save()?;

        self.storage.log_create(
            EntityType::CategoryGroup,
            group.id.to_string(),
            Some(group.name.clone()),
            &group,
        )?;

        Ok(group)
    }

    /// Get a group by ID
    pub fn get_group(&self, id: CategoryGroupId) -> TallyResult<Option<CategoryGroup>> {
        self.storage.categories.get_group(id)
    }

    /// Find a group by name (case-insensitive)
    pub fn find_group_by_name(&self, name: &str) -> TallyResult<Option<CategoryGroup>> {
        Ok(self
            .storage
            .categories
            .get_all_groups()?
            .into_iter()
            .find(|g| g.name.eq_ignore_ascii_case(name.trim())))
    }

    /// Rename a group
    pub fn update_group(&self, id: CategoryGroupId, name: &str) -> TallyResult<CategoryGroup> {
        let mut group = self
            .storage
            .categories
            .get_group(id)?
            .ok_or_else(|| TallyError::NotFound {
                entity_type: "CategoryGroup",
                identifier: id.to_string(),
            })?;

        let before = group.clone();
        group.name = name.trim().to_string();
        group.updated_at = Utc::now();
        group
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_group(group.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::CategoryGroup,
            group.id.to_string(),
            Some(group.name.clone()),
            &before,
            &group,
            None,
        )?;

        Ok(group)
    }

    /// Delete a group, moving its categories' transactions to
    /// `transfer_category_id` first
    pub fn delete_group(
        &self,
        id: CategoryGroupId,
        transfer_category_id: Option<CategoryId>,
    ) -> TallyResult<()> {
        let group = self
            .storage
            .categories
            .get_group(id)?
            .ok_or_else(|| TallyError::NotFound {
                entity_type: "CategoryGroup",
                identifier: id.to_string(),
            })?;

        for category in self.storage.categories.get_categories_in_group(id)? {
            self.delete_category(category.id, transfer_category_id)?;
        }

        self.storage.categories.delete_group(id)?;
        self.storage.categories.save()?;

        self.storage.log_delete(
            EntityType::CategoryGroup,
            id.to_string(),
            Some(group.name.clone()),
            &group,
        )?;

        Ok(())
    }

    /// List groups with their categories
    pub fn list_grouped(&self) -> TallyResult<Vec<GroupedCategories>> {
        let groups = self.storage.categories.get_all_groups()?;
        let mut result = Vec::with_capacity(groups.len());

        for group in groups {
            let categories = self.storage.categories.get_categories_in_group(group.id)?;
            result.push(GroupedCategories { group, categories });
        }

        Ok(result)
    }

    /// List all categories flat
    pub fn list(&self) -> TallyResult<Vec<Category>> {
        self.storage.categories.get_all_categories()
    }

    // ----- categories -----

    /// Create a new category in a group
    pub fn create(&self, name: &str, group_id: CategoryGroupId) -> TallyResult<Category> {
        let group = self
            .storage
            .categories
            .get_group(group_id)?
            .ok_or_else(|| TallyError::NotFound {
                entity_type: "CategoryGroup",
                identifier: group_id.to_string(),
            })?;

        if self
            .storage
            .categories
            .get_category_by_name(name.trim())?
            .is_some()
        {
            return Err(TallyError::Duplicate {
                entity_type: "Category",
                identifier: name.trim().to_string(),
            });
        }

        let mut category = Category::new(name.trim(), group_id);
        category.is_income = group.is_income;
        category.sort_order = self
            .storage
            .categories
            .get_categories_in_group(group_id)?
            .len() as i32;
        category
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_category(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        Ok(category)
    }

    /// Get a category by ID
    pub fn get(&self, id: CategoryId) -> TallyResult<Option<Category>> {
        self.storage.categories.get_category(id)
    }

    /// Update a category's name and visibility
    pub fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
        hidden: Option<bool>,
    ) -> TallyResult<Category> {
        let mut category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        let before = category.clone();

        if let Some(name) = name {
            category.name = name.trim().to_string();
        }
        if let Some(hidden) = hidden {
            category.hidden = hidden;
        }
        category.updated_at = Utc::now();
        category
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_category(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
            None,
        )?;

        Ok(category)
    }

    /// Move a category to another group
    pub fn move_to_group(
        &self,
        id: CategoryId,
        group_id: CategoryGroupId,
    ) -> TallyResult<Category> {
        self.storage
            .categories
            .get_group(group_id)?
            .ok_or_else(|| TallyError::NotFound {
                entity_type: "CategoryGroup",
                identifier: group_id.to_string(),
            })?;

        let mut category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        let before = category.clone();
        category.group_id = group_id;
        category.updated_at = Utc::now();

        self.storage.categories.upsert_category(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
            Some(format!("moved to group {}", group_id)),
        )?;

        Ok(category)
    }

    /// True when deleting the category requires choosing a transfer target
    /// (it is referenced by live transactions or allocations)
    pub fn must_transfer(&self, id: CategoryId) -> TallyResult<bool> {
        let has_transactions = self
            .storage
            .transactions
            .get_live()?
            .iter()
            .any(|t| t.category_id == Some(id));
        Ok(has_transactions)
    }

    /// Delete a category
    ///
    /// Live transactions referencing it are re-pointed to
    /// `transfer_category_id`; without a target while references exist,
    /// deletion is rejected. Its budget allocations are removed either
    /// way.
    pub fn delete_category(
        &self,
        id: CategoryId,
        transfer_category_id: Option<CategoryId>,
    ) -> TallyResult<()> {
        let category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        if let Some(target) = transfer_category_id {
            if target == id {
                return Err(TallyError::Validation(
                    "Cannot transfer a category's transactions to itself".into(),
                ));
            }
            self.storage
                .categories
                .get_category(target)?
                .ok_or_else(|| TallyError::category_not_found(target.to_string()))?;

            let patches: Vec<TransactionPatch> = self
                .storage
                .transactions
                .get_live()?
                .into_iter()
                .filter(|t| t.category_id == Some(id))
                .map(|t| {
                    let mut patch = TransactionPatch::new(t.id);
                    patch.category_id = Some(Some(target));
                    patch
                })
                .collect();
            TransactionService::new(self.storage).batch_update(patches)?;
        } else if self.must_transfer(id)? {
            return Err(TallyError::Validation(format!(
                "Category '{}' still has transactions; a transfer target is required",
                category.name
            )));
        }

        self.storage.budget.delete_for_category(id)?;
        self.storage.budget.save()?;
        self.storage.categories.delete_category(id)?;
        self.storage.categories.save()?;

        self.storage.log_delete(
            EntityType::Category,
            id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Account, Money, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_group_and_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let group = service.create_group("Bills", false).unwrap();
        let category = service.create("Electric", group.id).unwrap();

        assert_eq!(category.group_id, group.id);

        let grouped = service.list_grouped().unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].categories.len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let group = service.create_group("Bills", false).unwrap();
        service.create("Electric", group.id).unwrap();

        assert!(matches!(
            service.create("electric", group.id),
            Err(TallyError::Duplicate { .. })
        ));
        assert!(matches!(
            service.create_group("bills", false),
            Err(TallyError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_income_group_marks_categories() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let group = service.create_group("Income", true).unwrap();
        let category = service.create("Salary", group.id).unwrap();
        assert!(category.is_income);
    }

    #[test]
    fn test_move_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let bills = service.create_group("Bills", false).unwrap();
        let wants = service.create_group("Wants", false).unwrap();
        let category = service.create("Streaming", bills.id).unwrap();

        let moved = service.move_to_group(category.id, wants.id).unwrap();
        assert_eq!(moved.group_id, wants.id);
    }

    #[test]
    fn test_delete_with_transfer() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let group = service.create_group("Bills", false).unwrap();
        let old = service.create("Cable", group.id).unwrap();
        let new = service.create("Streaming", group.id).unwrap();

        let account = Account::new("Checking");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();
        let mut txn = Transaction::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Money::from_cents(-100),
        );
        txn.category_id = Some(old.id);
        storage.transactions.upsert(txn.clone()).unwrap();

        assert!(service.must_transfer(old.id).unwrap());

        // Without a target, deletion is rejected
        assert!(service.delete_category(old.id, None).is_err());

        service.delete_category(old.id, Some(new.id)).unwrap();
        assert!(service.get(old.id).unwrap().is_none());
        assert_eq!(
            storage.transactions.get(txn.id).unwrap().unwrap().category_id,
            Some(new.id)
        );
    }

    #[test]
    fn test_delete_unreferenced_without_target() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let group = service.create_group("Bills", false).unwrap();
        let category = service.create("Cable", group.id).unwrap();

        assert!(!service.must_transfer(category.id).unwrap());
        service.delete_category(category.id, None).unwrap();
        assert!(service.get(category.id).unwrap().is_none());
    }
}
