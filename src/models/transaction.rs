//! Transaction model
//!
//! Transactions are flat rows. A split transaction is a parent row
//! (`is_parent`) plus one child row per portion (`parent_id` set); the
//! children carry the categories and their amounts must sum to the parent
//! amount. Deletion is a soft delete via the `tombstone` flag so that sync
//! and repair tooling can reason about dead rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, PayeeId, TransactionId};
use super::money::Money;

/// Status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Transaction has not yet cleared the bank
    #[default]
    Pending,
    /// Transaction has cleared the bank
    Cleared,
    /// Transaction has been reconciled and is locked
    Reconciled,
}

impl TransactionStatus {
    /// Check if this transaction is locked (cannot be edited without unlocking)
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Reconciled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Cleared => write!(f, "Cleared"),
            Self::Reconciled => write!(f, "Reconciled"),
        }
    }
}

/// A financial transaction row
///
/// Invariants (enforced by `validate` and repaired by the split-repair
/// tool when historical data has drifted):
/// - a row is never both a parent and a child
/// - a parent row carries no category of its own
/// - live children of a parent sum to the parent amount
/// - children share the parent's account, date and status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The account this transaction belongs to
    pub account_id: AccountId,

    /// Transaction date
    pub date: NaiveDate,

    /// Amount (positive for inflow, negative for outflow)
    pub amount: Money,

    /// Payee (None for a blank payee)
    pub payee_id: Option<PayeeId>,

    /// Category (None for parents, transfers and uncategorized rows)
    pub category_id: Option<CategoryId>,

    /// Memo/notes
    #[serde(default)]
    pub memo: String,

    /// Transaction status
    #[serde(default)]
    pub status: TransactionStatus,

    /// True if this row heads a split transaction
    #[serde(default)]
    pub is_parent: bool,

    /// The parent row, when this row is one portion of a split
    pub parent_id: Option<TransactionId>,

    /// If this is a transfer, the ID of the paired transaction in the
    /// other account
    pub transfer_id: Option<TransactionId>,

    /// Soft-delete marker
    #[serde(default)]
    pub tombstone: bool,

    /// Position of a child within its split (display order)
    #[serde(default)]
    pub sort_order: i32,

    /// Import ID for duplicate detection during CSV import
    pub import_id: Option<String>,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(account_id: AccountId, date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account_id,
            date,
            amount,
            payee_id: None,
            category_id: None,
            memo: String::new(),
            status: TransactionStatus::Pending,
            is_parent: false,
            parent_id: None,
            transfer_id: None,
            tombstone: false,
            sort_order: 0,
            import_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a child row belonging to `parent`
    pub fn new_child(parent: &Transaction, amount: Money, sort_order: i32) -> Self {
        let mut child = Self::new(parent.account_id, parent.date, amount);
        child.parent_id = Some(parent.id);
        child.payee_id = parent.payee_id;
        child.status = parent.status;
        child.sort_order = sort_order;
        child
    }

    /// Check if this row heads a split
    pub fn is_split(&self) -> bool {
        self.is_parent
    }

    /// Check if this row is one portion of a split
    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Check if this is a transfer
    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }

    /// Check if this row has not been soft-deleted
    pub fn is_live(&self) -> bool {
        !self.tombstone
    }

    /// Check if this is an inflow (positive amount)
    pub fn is_inflow(&self) -> bool {
        self.amount.is_positive()
    }

    /// Check if this is an outflow (negative amount)
    pub fn is_outflow(&self) -> bool {
        self.amount.is_negative()
    }

    /// Check if this transaction is locked
    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    /// Set the status
    pub fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Soft-delete this row
    pub fn mark_deleted(&mut self) {
        self.tombstone = true;
        self.updated_at = Utc::now();
    }

    /// Validate a single row's structural invariants
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.is_parent && self.parent_id.is_some() {
            return Err(TransactionValidationError::ParentAndChild);
        }

        if self.is_parent && self.category_id.is_some() {
            return Err(TransactionValidationError::ParentWithCategory);
        }

        Ok(())
    }

    /// Validate a parent row against its live children
    pub fn validate_split(&self, children: &[Transaction]) -> Result<(), TransactionValidationError> {
        if !self.is_parent {
            return Ok(());
        }

        let total: Money = children
            .iter()
            .filter(|c| c.is_live())
            .map(|c| c.amount)
            .sum();

        if total != self.amount {
            return Err(TransactionValidationError::SplitsMismatch {
                transaction_amount: self.amount,
                splits_total: total,
            });
        }

        Ok(())
    }

    /// Generate an import ID for duplicate detection
    pub fn generate_import_id(&self) -> String {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.date.hash(&mut hasher);
        self.amount.cents().hash(&mut hasher);
        if let Some(payee_id) = self.payee_id {
            payee_id.as_uuid().hash(&mut hasher);
        }
        format!("imp-{:016x}", hasher.finish())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.amount)
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    SplitsMismatch {
        transaction_amount: Money,
        splits_total: Money,
    },
    ParentAndChild,
    ParentWithCategory,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SplitsMismatch {
                transaction_amount,
                splits_total,
            } => write!(
                f,
                "Split totals ({}) do not match transaction amount ({})",
                splits_total, transaction_amount
            ),
            Self::ParentAndChild => {
                write!(f, "Transaction cannot be both a split parent and a child")
            }
            Self::ParentWithCategory => {
                write!(f, "Split parent transactions should not have a category")
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}
