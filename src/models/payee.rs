//! Payee model
//!
//! Tracks payees along with how often and how recently they are used, which
//! backs category suggestions and the "common payees" listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::ids::{CategoryId, PayeeId};

/// A payee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payee {
    /// Unique identifier
    pub id: PayeeId,

    /// Payee name
    pub name: String,

    /// Default category for new transactions with this payee
    pub default_category_id: Option<CategoryId>,

    /// Category usage frequency for learning (category_id -> count)
    #[serde(default)]
    pub category_frequency: HashMap<CategoryId, u32>,

    /// When the payee was last used on a transaction
    pub last_used_at: Option<DateTime<Utc>>,

    /// Whether this payee was manually created vs auto-created from a
    /// transaction
    #[serde(default)]
    pub manual: bool,

    /// When the payee was created
    pub created_at: DateTime<Utc>,

    /// When the payee was last modified
    pub updated_at: DateTime<Utc>,
}

impl Payee {
    /// Create a new payee
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PayeeId::new(),
            name: name.into(),
            default_category_id: None,
            category_frequency: HashMap::new(),
            last_used_at: None,
            manual: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a use of this payee, optionally with the category it was
    /// used with
    pub fn record_usage(&mut self, category_id: Option<CategoryId>) {
        let now = Utc::now();
        self.last_used_at = Some(now);
        self.updated_at = now;

        if let Some(category_id) = category_id {
            *self.category_frequency.entry(category_id).or_insert(0) += 1;
            if !self.manual {
                self.update_default_from_frequency();
            }
        }
    }

    /// Update the default category based on frequency
    fn update_default_from_frequency(&mut self) {
        if let Some((&most_used_category, _)) = self
            .category_frequency
            .iter()
            .max_by_key(|(_, count)| *count)
        {
            self.default_category_id = Some(most_used_category);
        }
    }

    /// Get the suggested category (default or most frequent)
    pub fn suggested_category(&self) -> Option<CategoryId> {
        self.default_category_id.or_else(|| {
            self.category_frequency
                .iter()
                .max_by_key(|(_, count)| *count)
                .map(|(&category_id, _)| category_id)
        })
    }

    /// Total recorded uses across all categories
    pub fn usage_count(&self) -> u32 {
        self.category_frequency.values().sum()
    }

    /// Validate the payee
    pub fn validate(&self) -> Result<(), PayeeValidationError> {
        if self.name.trim().is_empty() {
            return Err(PayeeValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(PayeeValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Payee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for payees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayeeValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for PayeeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Payee name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Payee name too long: {} characters (max 100)", len)
            }
        }
    }
}

impl std::error::Error for PayeeValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payee() {
        let payee = Payee::new("Corner Store");
        assert_eq!(payee.name, "Corner Store");
        assert!(payee.last_used_at.is_none());
        assert_eq!(payee.usage_count(), 0);
    }

    #[test]
    fn test_usage_learning() {
        let mut payee = Payee::new("Corner Store");
        let groceries = CategoryId::new();
        let household = CategoryId::new();

        payee.record_usage(Some(groceries));
        payee.record_usage(Some(groceries));
        payee.record_usage(Some(household));

        assert_eq!(payee.usage_count(), 3);
        assert_eq!(payee.suggested_category(), Some(groceries));
        assert!(payee.last_used_at.is_some());
    }

    #[test]
    fn test_usage_without_category() {
        let mut payee = Payee::new("Corner Store");
        payee.record_usage(None);

        assert!(payee.last_used_at.is_some());
        assert_eq!(payee.usage_count(), 0);
        assert_eq!(payee.suggested_category(), None);
    }

    #[test]
    fn test_validation() {
        assert!(Payee::new("ok").validate().is_ok());
        assert_eq!(
            Payee::new("  ").validate(),
            Err(PayeeValidationError::EmptyName)
        );
    }
}
