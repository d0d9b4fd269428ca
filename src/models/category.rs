//! Category and CategoryGroup models
//!
//! Categories are organized into groups for display and organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryGroupId, CategoryId};

/// A group of related categories (e.g., "Bills", "Needs", "Wants")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Unique identifier
    pub id: CategoryGroupId,

    /// Group name
    pub name: String,

    /// Whether this is the income group
    #[serde(default)]
    pub is_income: bool,

    /// Sort order for display
    pub sort_order: i32,

    /// Whether this group is hidden
    #[serde(default)]
    pub hidden: bool,

    /// When the group was created
    pub created_at: DateTime<Utc>,

    /// When the group was last modified
    pub updated_at: DateTime<Utc>,
}

impl CategoryGroup {
    /// Create a new category group
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryGroupId::new(),
            name: name.into(),
            is_income: false,
            sort_order: 0,
            hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the income group
    pub fn new_income(name: impl Into<String>) -> Self {
        let mut group = Self::new(name);
        group.is_income = true;
        group
    }

    /// Validate the group
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A budget category within a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name
    pub name: String,

    /// The group this category belongs to
    pub group_id: CategoryGroupId,

    /// Whether this is an income category
    #[serde(default)]
    pub is_income: bool,

    /// Sort order within the group
    pub sort_order: i32,

    /// Whether this category is hidden
    #[serde(default)]
    pub hidden: bool,

    /// Notes about this category
    #[serde(default)]
    pub notes: String,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last modified
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>, group_id: CategoryGroupId) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            group_id,
            is_income: false,
            sort_order: 0,
            hidden: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories and groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Name too long: {} characters (max 50)", len),
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_and_category() {
        let group = CategoryGroup::new("Bills");
        let category = Category::new("Electric", group.id);

        assert_eq!(category.group_id, group.id);
        assert!(!group.is_income);
        assert!(category.validate().is_ok());
    }

    #[test]
    fn test_income_group() {
        let group = CategoryGroup::new_income("Income");
        assert!(group.is_income);
    }

    #[test]
    fn test_validation() {
        let group = CategoryGroup::new("");
        assert_eq!(group.validate(), Err(CategoryValidationError::EmptyName));

        let category = Category::new("x".repeat(51), CategoryGroupId::new());
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::NameTooLong(51))
        ));
    }
}
