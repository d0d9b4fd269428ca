//! Core data models for Tally
//!
//! This module contains all the data structures that represent the
//! budgeting domain: users, accounts, transactions, categories, payees and
//! budget allocations.

pub mod account;
pub mod budget;
pub mod category;
pub mod ids;
pub mod money;
pub mod payee;
pub mod transaction;
pub mod user;

pub use account::{Account, BankLink, SyncSource};
pub use budget::{BudgetAllocation, BudgetMonth};
pub use category::{Category, CategoryGroup};
pub use ids::{AccountId, CategoryGroupId, CategoryId, PayeeId, TransactionId, UserId};
pub use money::Money;
pub use payee::Payee;
pub use transaction::{Transaction, TransactionStatus};
pub use user::{User, UserRole};
