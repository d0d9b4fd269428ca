//! Storage initialization
//!
//! Handles first-run setup and default data creation.

use crate::config::paths::TallyPaths;
use crate::error::TallyError;
use crate::models::{Category, CategoryGroup};

use super::categories::CategoryData;
use super::file_io::write_json_atomic;

/// Default category groups with their starter categories
const DEFAULT_GROUPS: &[(&str, &[&str])] = &[
    (
        "Bills",
        &["Rent/Mortgage", "Electric", "Water", "Internet", "Phone"],
    ),
    ("Needs", &["Groceries", "Transportation", "Medical"]),
    ("Wants", &["Dining Out", "Entertainment", "Subscriptions"]),
    ("Savings", &["Emergency Fund", "Vacation"]),
];

/// Initialize storage for a fresh installation
///
/// Creates default category groups and basic structure.
pub fn initialize_storage(paths: &TallyPaths) -> Result<(), TallyError> {
    paths.ensure_directories()?;

    // Create default categories if budget.json doesn't exist
    if !paths.budget_file().exists() {
        create_default_categories(paths)?;
    }

    Ok(())
}

/// Create default category groups and some starter categories
fn create_default_categories(paths: &TallyPaths) -> Result<(), TallyError> {
    let mut groups = Vec::new();
    let mut categories = Vec::new();

    for (i, (group_name, category_names)) in DEFAULT_GROUPS.iter().enumerate() {
        let mut group = CategoryGroup::new(*group_name);
        group.sort_order = i as i32;
        let group_id = group.id;
        groups.push(group);

        for (j, category_name) in category_names.iter().enumerate() {
            let mut category = Category::new(*category_name, group_id);
            category.sort_order = j as i32;
            categories.push(category);
        }
    }

    // The income group holds the single income category
    let mut income_group = CategoryGroup::new_income("Income");
    income_group.sort_order = DEFAULT_GROUPS.len() as i32;
    let mut income = Category::new("Income", income_group.id);
    income.is_income = true;
    groups.push(income_group);
    categories.push(income);

    write_json_atomic(paths.budget_file(), &CategoryData { groups, categories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths).unwrap();
        assert!(paths.budget_file().exists());

        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let groups = storage.categories.get_all_groups().unwrap();
        assert_eq!(groups.len(), DEFAULT_GROUPS.len() + 1);
        assert!(groups.iter().any(|g| g.is_income));
        assert!(storage
            .categories
            .get_category_by_name("Groceries")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths).unwrap();
        let storage = Storage::new(paths.clone()).unwrap();
        storage.load_all().unwrap();
        let first_count = storage.categories.get_all_categories().unwrap().len();

        initialize_storage(&paths).unwrap();
        storage.load_all().unwrap();
        assert_eq!(
            storage.categories.get_all_categories().unwrap().len(),
            first_count
        );
    }
}
