//! Category repository for JSON storage
//!
//! Stores category groups and categories together in budget.json.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Category, CategoryGroup, CategoryGroupId, CategoryId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable category data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CategoryData {
    pub groups: Vec<CategoryGroup>,
    pub categories: Vec<Category>,
}

/// Repository for category and group persistence
pub struct CategoryRepository {
    path: PathBuf,
    groups: RwLock<HashMap<CategoryGroupId, CategoryGroup>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

impl CategoryRepository {
    /// Create a new category repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            groups: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Load groups and categories from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: CategoryData = read_json(&self.path)?;

        let mut groups = self.groups.write().map_err(lock_poisoned)?;
        let mut categories = self.categories.write().map_err(lock_poisoned)?;

        groups.clear();
        categories.clear();

        for group in file_data.groups {
            groups.insert(group.id, group);
        }
        for category in file_data.categories {
            categories.insert(category.id, category);
        }

        Ok(())
    }

    /// Save groups and categories to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let groups = self.groups.read().map_err(lock_poisoned)?;
        let categories = self.categories.read().map_err(lock_poisoned)?;

        let mut group_list: Vec<_> = groups.values().cloned().collect();
        group_list.sort_by_key(|g| (g.sort_order, g.name.clone()));

        let mut category_list: Vec<_> = categories.values().cloned().collect();
        category_list.sort_by_key(|c| (c.sort_order, c.name.clone()));

        write_json_atomic(
            &self.path,
            &CategoryData {
                groups: group_list,
                categories: category_list,
            },
        )
    }

    /// Get a group by ID
    pub fn get_group(&self, id: CategoryGroupId) -> Result<Option<CategoryGroup>, TallyError> {
        let groups = self.groups.read().map_err(lock_poisoned)?;
        Ok(groups.get(&id).cloned())
    }

    /// Get all groups
    pub fn get_all_groups(&self) -> Result<Vec<CategoryGroup>, TallyError> {
        let groups = self.groups.read().map_err(lock_poisoned)?;

        let mut list: Vec<_> = groups.values().cloned().collect();
        list.sort_by_key(|g| (g.sort_order, g.name.clone()));
        Ok(list)
    }

    /// Get a category by ID
    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_poisoned)?;
        Ok(categories.get(&id).cloned())
    }

    /// Get a category by name (case-insensitive)
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_poisoned)?;
        Ok(categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    /// Get all categories
    pub fn get_all_categories(&self) -> Result<Vec<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_poisoned)?;

        let mut list: Vec<_> = categories.values().cloned().collect();
        list.sort_by_key(|c| (c.sort_order, c.name.clone()));
        Ok(list)
    }

    /// Get the categories in a group
    pub fn get_categories_in_group(
        &self,
        group_id: CategoryGroupId,
    ) -> Result<Vec<Category>, TallyError> {
        Ok(self
            .get_all_categories()?
            .into_iter()
            .filter(|c| c.group_id == group_id)
            .collect())
    }

    /// Insert or update a group
    pub fn upsert_group(&self, group: CategoryGroup) -> Result<(), TallyError> {
        let mut groups = self.groups.write().map_err(lock_poisoned)?;
        groups.insert(group.id, group);
        Ok(())
    }

    /// Insert or update a category
    pub fn upsert_category(&self, category: Category) -> Result<(), TallyError> {
        let mut categories = self.categories.write().map_err(lock_poisoned)?;
        categories.insert(category.id, category);
        Ok(())
    }

    /// Delete a group (categories must be moved or deleted first)
    pub fn delete_group(&self, id: CategoryGroupId) -> Result<bool, TallyError> {
        let mut groups = self.groups.write().map_err(lock_poisoned)?;
        Ok(groups.remove(&id).is_some())
    }

    /// Delete a category
    pub fn delete_category(&self, id: CategoryId) -> Result<bool, TallyError> {
        let mut categories = self.categories.write().map_err(lock_poisoned)?;
        Ok(categories.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CategoryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("budget.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_groups_and_categories() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let group = CategoryGroup::new("Bills");
        let group_id = group.id;
        repo.upsert_group(group).unwrap();

        let category = Category::new("Electric", group_id);
        repo.upsert_category(category).unwrap();

        assert_eq!(repo.get_all_groups().unwrap().len(), 1);
        assert_eq!(repo.get_categories_in_group(group_id).unwrap().len(), 1);
        assert!(repo.get_category_by_name("electric").unwrap().is_some());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let group = CategoryGroup::new("Bills");
        let category = Category::new("Electric", group.id);
        repo.upsert_group(group).unwrap();
        repo.upsert_category(category).unwrap();
        repo.save().unwrap();

        let repo2 = CategoryRepository::new(temp_dir.path().join("budget.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get_all_categories().unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let group = CategoryGroup::new("Bills");
        let group_id = group.id;
        repo.upsert_group(group).unwrap();

        assert!(repo.delete_group(group_id).unwrap());
        assert!(!repo.delete_group(group_id).unwrap());
    }
}
