//! Transaction service
//!
//! Business logic for transaction management: CRUD, split creation,
//! transfers, and the patch-based batch update used by repair tooling.

use chrono::{NaiveDate, Utc};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{TallyError, TallyResult};
use crate::models::{
    AccountId, CategoryId, Money, PayeeId, Transaction, TransactionId, TransactionStatus,
};
use crate::storage::Storage;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by account
    pub account_id: Option<AccountId>,
    /// Filter by date range start
    pub start_date: Option<NaiveDate>,
    /// Filter by date range end
    pub end_date: Option<NaiveDate>,
    /// Filter by status
    pub status: Option<TransactionStatus>,
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by account
    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Filter by date range
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Filter by status
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub payee_name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub memo: Option<String>,
    pub status: Option<TransactionStatus>,
}

/// One portion of a split transaction
#[derive(Debug, Clone)]
pub struct SplitInput {
    pub category_id: CategoryId,
    pub amount: Money,
    pub memo: Option<String>,
}

/// A field-level update to one transaction row
///
/// `None` leaves a field unchanged; for nullable fields the inner Option
/// distinguishes "set" from "clear":
/// - `payee_id: Some(None)` clears the payee
/// - `category_id: Some(Some(id))` sets the category
#[derive(Debug, Clone)]
pub struct TransactionPatch {
    pub id: TransactionId,
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub payee_id: Option<Option<PayeeId>>,
    pub category_id: Option<Option<CategoryId>>,
    pub memo: Option<String>,
    pub status: Option<TransactionStatus>,
    pub tombstone: Option<bool>,
}

impl TransactionPatch {
    /// Create an empty patch for a row
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            date: None,
            amount: None,
            payee_id: None,
            category_id: None,
            memo: None,
            status: None,
            tombstone: None,
        }
    }
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new transaction
    pub fn create(&self, input: CreateTransactionInput) -> TallyResult<Transaction> {
        // Verify account exists
        let account = self
            .storage
            .accounts
            .get(input.account_id)?
            .ok_or_else(|| TallyError::account_not_found(input.account_id.to_string()))?;

        if account.closed {
            return Err(TallyError::Validation(
                "Cannot add transactions to a closed account".into(),
            ));
        }

        // Verify category exists if provided
        if let Some(cat_id) = input.category_id {
            self.storage
                .categories
                .get_category(cat_id)?
                .ok_or_else(|| TallyError::category_not_found(cat_id.to_string()))?;
        }

        let mut txn = Transaction::new(input.account_id, input.date, input.amount);
        txn.category_id = input.category_id;

        if let Some(payee_name) = input.payee_name {
            let payee_name = payee_name.trim();
            if !payee_name.is_empty() {
                let mut payee = self.storage.payees.get_or_create(payee_name)?;
                payee.record_usage(input.category_id);
                txn.payee_id = Some(payee.id);
                self.storage.payees.upsert(payee)?;
            }
        }

        if let Some(memo) = input.memo {
            txn.memo = memo;
        }

        if let Some(status) = input.status {
            txn.status = status;
        }

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.payees.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(format!("{} {}", txn.date, txn.amount)),
            &txn,
        )?;

        Ok(txn)
    }

    /// Create a split transaction: one parent row plus a child row per
    /// portion
    ///
    /// The portions must sum to the parent amount.
    pub fn create_split(
        &self,
        input: CreateTransactionInput,
        splits: Vec<SplitInput>,
    ) -> TallyResult<Transaction> {
        if splits.len() < 2 {
            return Err(TallyError::Validation(
                "A split transaction needs at least two portions".into(),
            ));
        }

        let split_total: Money = splits.iter().map(|s| s.amount).sum();
        if split_total != input.amount {
            return Err(TallyError::Validation(format!(
                "Split totals ({}) do not match transaction amount ({})",
                split_total, input.amount
            )));
        }

        for split in &splits {
            self.storage
                .categories
                .get_category(split.category_id)?
                .ok_or_else(|| TallyError::category_not_found(split.category_id.to_string()))?;
        }

        // The parent carries the payee and total but no category
        let mut parent = self.create(CreateTransactionInput {
            category_id: None,
            ..input
        })?;
        parent.is_parent = true;
        self.storage.transactions.upsert(parent.clone())?;

        for (i, split) in splits.into_iter().enumerate() {
            let mut child = Transaction::new_child(&parent, split.amount, i as i32);
            child.category_id = Some(split.category_id);
            if let Some(memo) = split.memo {
                child.memo = memo;
            }
            self.storage.transactions.upsert(child)?;
        }

        self.storage.transactions.save()?;
        Ok(parent)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> TallyResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Get a parent row together with its live children
    pub fn get_with_children(
        &self,
        id: TransactionId,
    ) -> TallyResult<Option<(Transaction, Vec<Transaction>)>> {
        let Some(txn) = self.storage.transactions.get(id)? else {
            return Ok(None);
        };
        let children = if txn.is_parent {
            self.storage
                .transactions
                .get_children(id)?
                .into_iter()
                .filter(|c| c.is_live())
                .collect()
        } else {
            Vec::new()
        };
        Ok(Some((txn, children)))
    }

    /// List live transactions with optional filtering
    pub fn list(&self, filter: TransactionFilter) -> TallyResult<Vec<Transaction>> {
        let mut transactions = if let Some(account_id) = filter.account_id {
            self.storage.transactions.get_by_account(account_id)?
        } else if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            self.storage.transactions.get_by_date_range(start, end)?
        } else {
            self.storage.transactions.get_live()?
        };

        if let Some(start) = filter.start_date {
            transactions.retain(|t| t.date >= start);
        }
        if let Some(end) = filter.end_date {
            transactions.retain(|t| t.date <= end);
        }
        if let Some(status) = filter.status {
            transactions.retain(|t| t.status == status);
        }
        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }

    /// Apply a single patch
    pub fn update(&self, patch: TransactionPatch) -> TallyResult<Transaction> {
        let updated = self.batch_update(vec![patch])?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| TallyError::Storage("Batch update returned no rows".into()))
    }

    /// Apply a set of patches, audit them as one batch, and save once
    ///
    /// Locked (reconciled) rows reject edits except status changes, which
    /// repair tooling needs to re-sync children with their parents.
    pub fn batch_update(&self, patches: Vec<TransactionPatch>) -> TallyResult<Vec<Transaction>> {
        let mut audit_entries = Vec::new();
        let mut updated = Vec::new();

        for patch in patches {
            let mut txn = self
                .storage
                .transactions
                .get(patch.id)?
                .ok_or_else(|| TallyError::transaction_not_found(patch.id.to_string()))?;

            let only_status = patch.date.is_none()
                && patch.amount.is_none()
                && patch.payee_id.is_none()
                && patch.category_id.is_none()
                && patch.memo.is_none()
                && patch.tombstone.is_none();
            if txn.is_locked() && !only_status {
                return Err(TallyError::Locked(format!(
                    "Transaction {} is reconciled and cannot be edited",
                    txn.id
                )));
            }

            let before = txn.clone();

            if let Some(date) = patch.date {
                txn.date = date;
            }
            if let Some(amount) = patch.amount {
                txn.amount = amount;
            }
            if let Some(payee_id) = patch.payee_id {
                txn.payee_id = payee_id;
            }
            if let Some(category_id) = patch.category_id {
                if let Some(cat_id) = category_id {
                    self.storage
                        .categories
                        .get_category(cat_id)?
                        .ok_or_else(|| TallyError::category_not_found(cat_id.to_string()))?;
                }
                txn.category_id = category_id;
            }
            if let Some(memo) = patch.memo {
                txn.memo = memo;
            }
            if let Some(status) = patch.status {
                txn.status = status;
            }
            if let Some(tombstone) = patch.tombstone {
                txn.tombstone = tombstone;
            }
            txn.updated_at = Utc::now();

            txn.validate()
                .map_err(|e| TallyError::Validation(e.to_string()))?;

            self.storage.transactions.upsert(txn.clone())?;
            audit_entries.push(AuditEntry::update(
                EntityType::Transaction,
                txn.id.to_string(),
                Some(format!("{} {}", txn.date, txn.amount)),
                &before,
                &txn,
                None,
            ));
            updated.push(txn);
        }

        self.storage.transactions.save()?;
        self.storage.audit().log_batch(&audit_entries)?;
        Ok(updated)
    }

    /// Soft-delete a transaction
    ///
    /// Tombstones the row, its children (for a split parent) and its
    /// transfer pair.
    pub fn delete(&self, id: TransactionId) -> TallyResult<Transaction> {
        let txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        if txn.is_locked() {
            return Err(TallyError::Locked(format!(
                "Transaction {} is reconciled and cannot be deleted",
                id
            )));
        }

        let mut patches = vec![{
            let mut p = TransactionPatch::new(id);
            p.tombstone = Some(true);
            p
        }];

        if txn.is_parent {
            for child in self.storage.transactions.get_children(id)? {
                if child.is_live() {
                    let mut p = TransactionPatch::new(child.id);
                    p.tombstone = Some(true);
                    patches.push(p);
                }
            }
        }

        if let Some(pair_id) = txn.transfer_id {
            if let Some(pair) = self.storage.transactions.get(pair_id)? {
                if pair.is_locked() {
                    return Err(TallyError::Locked(format!(
                        "Linked transfer transaction {} is reconciled and cannot be deleted",
                        pair_id
                    )));
                }
                if pair.is_live() {
                    let mut p = TransactionPatch::new(pair_id);
                    p.tombstone = Some(true);
                    patches.push(p);
                }
            }
        }

        self.batch_update(patches)?;

        self.storage.log_delete(
            EntityType::Transaction,
            id.to_string(),
            Some(format!("{} {}", txn.date, txn.amount)),
            &txn,
        )?;

        // Return the tombstoned row
        self.storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))
    }

    /// Create a transfer between two accounts: a pair of linked rows with
    /// opposite amounts
    ///
    /// Transfers between accounts on the same side of the on/off-budget
    /// boundary carry no category.
    pub fn create_transfer(
        &self,
        from_account: AccountId,
        to_account: AccountId,
        amount: Money,
        date: NaiveDate,
    ) -> TallyResult<(Transaction, Transaction)> {
        if from_account == to_account {
            return Err(TallyError::Validation(
                "Cannot transfer within the same account".into(),
            ));
        }

        for account_id in [from_account, to_account] {
            self.storage
                .accounts
                .get(account_id)?
                .ok_or_else(|| TallyError::account_not_found(account_id.to_string()))?;
        }

        let mut outgoing = Transaction::new(from_account, date, -amount.abs());
        let mut incoming = Transaction::new(to_account, date, amount.abs());
        outgoing.transfer_id = Some(incoming.id);
        incoming.transfer_id = Some(outgoing.id);

        self.storage.transactions.upsert(outgoing.clone())?;
        self.storage.transactions.upsert(incoming.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            outgoing.id.to_string(),
            Some(format!("transfer {}", amount.abs())),
            &outgoing,
        )?;

        Ok((outgoing, incoming))
    }

    /// Count all transaction rows
    pub fn count(&self) -> TallyResult<usize> {
        self.storage.transactions.count()
    }
}
