//! Account model
//!
//! Represents financial accounts (checking, savings, credit cards, etc.),
//! including accounts linked to an external bank through the bank-link flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;

/// Where a linked account's transactions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    /// Linked through the GoCardless-style bank authorization flow
    GoCardless,
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoCardless => write!(f, "gocardless"),
        }
    }
}

/// Bank-link details stored on a linked account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankLink {
    /// Which provider the account is linked through
    pub sync_source: SyncSource,

    /// The provider's id for the underlying bank account
    pub external_id: String,

    /// The requisition (authorization session) that produced the link
    pub requisition_id: String,
}

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Chase Checking")
    pub name: String,

    /// Whether this account is included in the budget
    ///
    /// Off-budget accounts (like investments) don't affect the budget, and
    /// transfers that cross the on/off-budget boundary keep their category.
    pub on_budget: bool,

    /// Whether this account is closed (soft-deleted)
    pub closed: bool,

    /// Opening balance when the account was created
    pub starting_balance: Money,

    /// Bank-link details, when the account is linked to an external bank
    pub bank_link: Option<BankLink>,

    /// Notes about this account
    #[serde(default)]
    pub notes: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,

    /// Sort order for display
    #[serde(default)]
    pub sort_order: i32,
}

impl Account {
    /// Create a new on-budget account with default values
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            on_budget: true,
            closed: false,
            starting_balance: Money::zero(),
            bank_link: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
            sort_order: 0,
        }
    }

    /// Create a new off-budget account
    pub fn new_off_budget(name: impl Into<String>) -> Self {
        let mut account = Self::new(name);
        account.on_budget = false;
        account
    }

    /// Check if this account is linked to an external bank
    pub fn is_linked(&self) -> bool {
        self.bank_link.is_some()
    }

    /// Attach bank-link details to this account
    pub fn link(&mut self, link: BankLink) {
        self.bank_link = Some(link);
        self.updated_at = Utc::now();
    }

    /// Remove bank-link details from this account
    pub fn unlink(&mut self) {
        self.bank_link = None;
        self.updated_at = Utc::now();
    }

    /// Close this account
    pub fn close(&mut self) {
        self.closed = true;
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Account name cannot be empty".to_string());
        }
        if self.name.len() > 100 {
            return Err(format!("Account name too long: {} characters", self.name.len()));
        }
        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
