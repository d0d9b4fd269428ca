//! Budget service
//!
//! Monthly budget math: bounds, per-month cell values, and setting
//! allocation amounts. Also the budget-file name helpers.

use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{BudgetAllocation, BudgetMonth, CategoryId, Money};
use crate::storage::Storage;

/// Longest accepted budget-file name
const MAX_BUDGET_NAME: usize = 100;

/// One name/value cell of a budget month
#[derive(Debug, Clone, Serialize)]
pub struct BudgetCell {
    pub name: String,
    pub value: i64,
}

/// The budgeting range covered by the data
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetBounds {
    pub start: BudgetMonth,
    pub end: BudgetMonth,
}

/// Service for budget allocations
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// The months budgeting covers: from the earliest live transaction to
    /// one month past the latest (or the current month alone when there is
    /// no data)
    pub fn bounds(&self) -> TallyResult<BudgetBounds> {
        let transactions = self.storage.transactions.get_live()?;

        let Some(min_date) = transactions.iter().map(|t| t.date).min() else {
            let now = BudgetMonth::current();
            return Ok(BudgetBounds { start: now, end: now.next() });
        };
        let max_date = transactions
            .iter()
            .map(|t| t.date)
            .max()
            .expect("non-empty");

        Ok(BudgetBounds {
            start: BudgetMonth::containing(min_date),
            end: BudgetMonth::containing(max_date).next(),
        })
    }

    /// Set the budgeted amount for a category in a month
    pub fn set_amount(
        &self,
        month: BudgetMonth,
        category_id: CategoryId,
        amount: Money,
    ) -> TallyResult<BudgetAllocation> {
        self.storage
            .categories
            .get_category(category_id)?
            .ok_or_else(|| TallyError::category_not_found(category_id.to_string()))?;

        let mut allocation = self
            .storage
            .budget
            .get(month, category_id)?
            .unwrap_or_else(|| BudgetAllocation::new(category_id, month));
        let before = allocation.clone();

        allocation.set_budgeted(amount);
        self.storage.budget.upsert(allocation.clone())?;
        self.storage.budget.save()?;

        self.storage.log_update(
            EntityType::BudgetAllocation,
            format!("{}/{}", month, category_id),
            None,
            &before,
            &allocation,
            Some(format!("budgeted: {} -> {}", before.budgeted, amount)),
        )?;

        Ok(allocation)
    }

    /// Name/value cells for one month: per category `budget-*`, `spent-*`
    /// and `balance-*`, plus `total-budgeted` and `total-spent`
    ///
    /// Values are cents. Spending is the sum of live, non-parent rows in
    /// the month (children carry the categories of a split).
    pub fn month_values(&self, month: BudgetMonth) -> TallyResult<Vec<BudgetCell>> {
        let categories = self.storage.categories.get_all_categories()?;
        let allocations = self.storage.budget.get_for_month(month)?;
        let transactions = self.storage.transactions.get_live()?;

        let mut cells = Vec::new();
        let mut total_budgeted = Money::zero();
        let mut total_spent = Money::zero();

        for category in &categories {
            let budgeted = allocations
                .iter()
                .find(|a| a.category_id == category.id)
                .map(|a| a.budgeted)
                .unwrap_or_else(Money::zero);

            let spent: Money = transactions
                .iter()
                .filter(|t| {
                    !t.is_parent
                        && t.category_id == Some(category.id)
                        && month.contains(t.date)
                })
                .map(|t| t.amount)
                .sum();

            total_budgeted += budgeted;
            total_spent += spent;

            cells.push(BudgetCell {
                name: format!("budget-{}", category.id),
                value: budgeted.cents(),
            });
            cells.push(BudgetCell {
                name: format!("spent-{}", category.id),
                value: spent.cents(),
            });
            cells.push(BudgetCell {
                name: format!("balance-{}", category.id),
                value: (budgeted + spent).cents(),
            });
        }

        cells.push(BudgetCell {
            name: "total-budgeted".to_string(),
            value: total_budgeted.cents(),
        });
        cells.push(BudgetCell {
            name: "total-spent".to_string(),
            value: total_spent.cents(),
        });

        Ok(cells)
    }
}

/// Validate a budget-file name
///
/// Returns the validation failure message, or None when the name is fine.
pub fn validate_budget_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Some("Budget name cannot be empty".to_string());
    }
    if trimmed.len() > MAX_BUDGET_NAME {
        return Some(format!(
            "Budget name too long (max {} characters)",
            MAX_BUDGET_NAME
        ));
    }
    if trimmed.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0')) {
        return Some("Budget name contains invalid characters".to_string());
    }
    None
}

/// Produce a name not present in `existing` by appending " 2", " 3", ...
pub fn unique_budget_name(name: &str, existing: &[String]) -> String {
    let name = name.trim();
    let taken = |candidate: &str| existing.iter().any(|e| e.eq_ignore_ascii_case(candidate));

    if !taken(name) {
        return name.to_string();
    }

    let mut n = 2;
    loop {
        let candidate = format!("{} {}", name, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Account, Category, CategoryGroup, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn setup_category(storage: &Storage) -> CategoryId {
        let group = CategoryGroup::new("Group");
        storage.categories.upsert_group(group.clone()).unwrap();
        let category = Category::new("Groceries", group.id);
        let id = category.id;
        storage.categories.upsert_category(category).unwrap();
        id
    }

    fn insert_txn(storage: &Storage, date: NaiveDate, cents: i64, category: Option<CategoryId>) {
        let account = Account::new("Checking");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();

        let mut txn = Transaction::new(account_id, date, Money::from_cents(cents));
        txn.category_id = category;
        storage.transactions.upsert(txn).unwrap();
    }

    #[test]
    fn test_bounds_without_data() {
        let (_temp_dir, storage) = create_test_storage();
        let bounds = BudgetService::new(&storage).bounds().unwrap();
        assert_eq!(bounds.end, bounds.start.next());
    }

    #[test]
    fn test_bounds_follow_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        let category = setup_category(&storage);
        insert_txn(
            &storage,
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
            -100,
            Some(category),
        );
        insert_txn(
            &storage,
            NaiveDate::from_ymd_opt(2025, 2, 20).unwrap(),
            -100,
            Some(category),
        );

        let bounds = BudgetService::new(&storage).bounds().unwrap();
        assert_eq!(bounds.start, BudgetMonth::new(2024, 11).unwrap());
        assert_eq!(bounds.end, BudgetMonth::new(2025, 3).unwrap());
    }

    #[test]
    fn test_month_values() {
        let (_temp_dir, storage) = create_test_storage();
        let category = setup_category(&storage);
        let service = BudgetService::new(&storage);
        let month = BudgetMonth::new(2025, 1).unwrap();

        service
            .set_amount(month, category, Money::from_cents(50000))
            .unwrap();
        insert_txn(
            &storage,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            -12000,
            Some(category),
        );
        // Outside the month: ignored
        insert_txn(
            &storage,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            -9999,
            Some(category),
        );

        let cells = service.month_values(month).unwrap();
        let get = |name: &str| {
            cells
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.value)
                .unwrap()
        };

        assert_eq!(get(&format!("budget-{}", category)), 50000);
        assert_eq!(get(&format!("spent-{}", category)), -12000);
        assert_eq!(get(&format!("balance-{}", category)), 38000);
        assert_eq!(get("total-budgeted"), 50000);
        assert_eq!(get("total-spent"), -12000);
    }

    #[test]
    fn test_set_amount_requires_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);

        let result = service.set_amount(
            BudgetMonth::new(2025, 1).unwrap(),
            CategoryId::new(),
            Money::from_cents(100),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_budget_name() {
        assert!(validate_budget_name("My Budget").is_none());
        assert!(validate_budget_name("   ").is_some());
        assert!(validate_budget_name("bad/name").is_some());
        assert!(validate_budget_name(&"x".repeat(101)).is_some());
    }

    #[test]
    fn test_unique_budget_name() {
        let existing = vec!["My Budget".to_string(), "My Budget 2".to_string()];
        assert_eq!(unique_budget_name("Fresh", &existing), "Fresh");
        assert_eq!(unique_budget_name("My Budget", &existing), "My Budget 3");
        assert_eq!(unique_budget_name("my budget", &existing), "my budget 3");
    }
}
