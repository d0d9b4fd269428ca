//! Split-transaction repair
//!
//! Historical data can drift out of shape: children missing the parent's
//! payee, cleared flags out of sync, live children under dead parents,
//! split totals that no longer add up, and transfers that picked up a
//! category they should not have. `fix_split_transactions` runs the
//! repairs in sequence and reports what it touched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TallyResult;
use crate::models::{Money, Transaction, TransactionId};
use crate::storage::Storage;

use super::transaction::{TransactionPatch, TransactionService};

/// A split parent whose live children do not sum to its amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitMismatch {
    /// The parent row
    pub transaction_id: TransactionId,
    /// The parent's amount
    pub transaction_amount: Money,
    /// What the live children actually sum to
    pub splits_total: Money,
}

/// Counts of what the repair touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairReport {
    /// Children that had the parent's payee copied onto them
    pub num_blank_payees: usize,
    /// Children whose cleared status was re-synced with the parent
    pub num_cleared: usize,
    /// Orphaned children that were tombstoned
    pub num_deleted: usize,
    /// Transfer rows that had a category cleared
    pub num_transfers_fixed: usize,
    /// Split parents whose amounts do not add up (reported, not fixed)
    pub mismatched_splits: Vec<SplitMismatch>,
}

impl RepairReport {
    /// True when nothing was repaired and nothing is mismatched
    pub fn is_clean(&self) -> bool {
        self.num_blank_payees == 0
            && self.num_cleared == 0
            && self.num_deleted == 0
            && self.num_transfers_fixed == 0
            && self.mismatched_splits.is_empty()
    }
}

/// Service running the split-transaction repairs
pub struct RepairService<'a> {
    storage: &'a Storage,
}

impl<'a> RepairService<'a> {
    /// Create a new repair service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Run all split-transaction repairs and report counts
    pub fn fix_split_transactions(&self) -> TallyResult<RepairReport> {
        let transactions = TransactionService::new(self.storage);
        let all = self.storage.transactions.get_all()?;
        let by_id: HashMap<TransactionId, &Transaction> =
            all.iter().map(|t| (t.id, t)).collect();

        let parent_of = |t: &Transaction| t.parent_id.and_then(|id| by_id.get(&id).copied());

        // 1. Children with a blank payee whose parent has one: copy the
        //    parent's payee down.
        let blank_payee_patches: Vec<TransactionPatch> = all
            .iter()
            .filter(|t| t.is_child() && t.payee_id.is_none())
            .filter_map(|t| {
                let parent_payee = parent_of(t)?.payee_id?;
                let mut patch = TransactionPatch::new(t.id);
                patch.payee_id = Some(Some(parent_payee));
                Some(patch)
            })
            .collect();
        let num_blank_payees = blank_payee_patches.len();
        transactions.batch_update(blank_payee_patches)?;

        // 2. Children whose cleared status differs from the parent's: take
        //    the parent's.
        let cleared_patches: Vec<TransactionPatch> = all
            .iter()
            .filter(|t| t.is_child())
            .filter_map(|t| {
                let parent = parent_of(t)?;
                if t.status == parent.status {
                    return None;
                }
                let mut patch = TransactionPatch::new(t.id);
                patch.status = Some(parent.status);
                Some(patch)
            })
            .collect();
        let num_cleared = cleared_patches.len();
        transactions.batch_update(cleared_patches)?;

        // 3. Live children under a dead or missing parent: tombstone them.
        let orphan_patches: Vec<TransactionPatch> = all
            .iter()
            .filter(|t| t.is_child() && t.is_live())
            .filter(|t| match parent_of(t) {
                Some(parent) => parent.tombstone,
                None => true,
            })
            .map(|t| {
                let mut patch = TransactionPatch::new(t.id);
                patch.tombstone = Some(true);
                patch
            })
            .collect();
        let num_deleted = orphan_patches.len();
        transactions.batch_update(orphan_patches)?;

        // 4. Split parents whose live children do not sum to the parent
        //    amount. Only reported; fixing would mean guessing which
        //    amount the user intended.
        //
        // Re-read rows so the tombstones from step 3 are taken into
        // account.
        let all = self.storage.transactions.get_all()?;
        let mut mismatched_splits = Vec::new();
        for parent in all.iter().filter(|t| t.is_parent && t.is_live()) {
            let children = self.storage.transactions.get_children(parent.id)?;
            let splits_total: Money = children
                .iter()
                .filter(|c| c.is_live())
                .map(|c| c.amount)
                .sum();
            if splits_total != parent.amount {
                mismatched_splits.push(SplitMismatch {
                    transaction_id: parent.id,
                    transaction_amount: parent.amount,
                    splits_total,
                });
            }
        }

        // 5. Transfers between two accounts on the same side of the
        //    on/off-budget boundary must not carry a category.
        let transfer_patches: Vec<TransactionPatch> = all
            .iter()
            .filter(|t| t.category_id.is_some())
            .filter_map(|t| {
                let pair = by_id.get(&t.transfer_id?)?;
                let this_account = self.storage.accounts.get(t.account_id).ok()??;
                let pair_account = self.storage.accounts.get(pair.account_id).ok()??;
                if this_account.on_budget != pair_account.on_budget {
                    return None;
                }
                let mut patch = TransactionPatch::new(t.id);
                patch.category_id = Some(None);
                Some(patch)
            })
            .collect();
        let num_transfers_fixed = transfer_patches.len();
        transactions.batch_update(transfer_patches)?;

        Ok(RepairReport {
            num_blank_payees,
            num_cleared,
            num_deleted,
            num_transfers_fixed,
            mismatched_splits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{
        Account, AccountId, Category, CategoryGroup, CategoryId, TransactionStatus,
    };
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn setup_account(storage: &Storage, name: &str, on_budget: bool) -> AccountId {
        let mut account = Account::new(name);
        account.on_budget = on_budget;
        let id = account.id;
        storage.accounts.upsert(account).unwrap();
        id
    }

    fn setup_category(storage: &Storage) -> CategoryId {
        let group = CategoryGroup::new("Group");
        storage.categories.upsert_group(group.clone()).unwrap();
        let category = Category::new("Groceries", group.id);
        let id = category.id;
        storage.categories.upsert_category(category).unwrap();
        id
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn insert_split(
        storage: &Storage,
        account_id: AccountId,
        amounts: &[i64],
    ) -> (Transaction, Vec<Transaction>) {
        let total: i64 = amounts.iter().sum();
        let mut parent = Transaction::new(account_id, test_date(), Money::from_cents(total));
        parent.is_parent = true;
        storage.transactions.upsert(parent.clone()).unwrap();

        let children: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, &cents)| {
                let child = Transaction::new_child(&parent, Money::from_cents(cents), i as i32);
                storage.transactions.upsert(child.clone()).unwrap();
                child
            })
            .collect();

        (parent, children)
    }

    #[test]
    fn test_clean_data_reports_clean() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);
        insert_split(&storage, account_id, &[-6000, -4000]);

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_blank_child_payee_filled_from_parent() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        let (mut parent, children) = insert_split(&storage, account_id, &[-6000, -4000]);
        let payee = storage.payees.get_or_create("Corner Store").unwrap();
        parent.payee_id = Some(payee.id);
        storage.transactions.upsert(parent.clone()).unwrap();
        // One child lost its payee
        let mut blank = children[0].clone();
        blank.payee_id = None;
        storage.transactions.upsert(blank.clone()).unwrap();

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.num_blank_payees, 1);

        let repaired = storage.transactions.get(blank.id).unwrap().unwrap();
        assert_eq!(repaired.payee_id, Some(payee.id));
    }

    #[test]
    fn test_child_without_payee_anywhere_left_alone() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);
        insert_split(&storage, account_id, &[-6000, -4000]);

        // Neither parent nor children have payees
        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.num_blank_payees, 0);
    }

    #[test]
    fn test_cleared_status_synced_with_parent() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        let (mut parent, children) = insert_split(&storage, account_id, &[-6000, -4000]);
        parent.status = TransactionStatus::Cleared;
        storage.transactions.upsert(parent).unwrap();
        // Children still pending

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.num_cleared, 2);

        for child in children {
            let repaired = storage.transactions.get(child.id).unwrap().unwrap();
            assert_eq!(repaired.status, TransactionStatus::Cleared);
        }
    }

    #[test]
    fn test_orphaned_children_tombstoned() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        // Dead parent with live children
        let (mut parent, children) = insert_split(&storage, account_id, &[-6000, -4000]);
        parent.tombstone = true;
        storage.transactions.upsert(parent).unwrap();

        // Child with a missing parent
        let mut ghost_parent =
            Transaction::new(account_id, test_date(), Money::from_cents(-1000));
        ghost_parent.is_parent = true;
        let orphan = Transaction::new_child(&ghost_parent, Money::from_cents(-1000), 0);
        storage.transactions.upsert(orphan.clone()).unwrap();

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.num_deleted, 3);

        for id in children.iter().map(|c| c.id).chain([orphan.id]) {
            assert!(storage.transactions.get(id).unwrap().unwrap().tombstone);
        }
    }

    #[test]
    fn test_mismatched_splits_reported_not_fixed() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        let (parent, _children) = insert_split(&storage, account_id, &[-6000, -4000]);
        // Drift the parent amount
        let mut drifted = parent.clone();
        drifted.amount = Money::from_cents(-12000);
        storage.transactions.upsert(drifted).unwrap();

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.mismatched_splits.len(), 1);
        let mismatch = &report.mismatched_splits[0];
        assert_eq!(mismatch.transaction_id, parent.id);
        assert_eq!(mismatch.transaction_amount.cents(), -12000);
        assert_eq!(mismatch.splits_total.cents(), -10000);

        // The amounts were not altered
        let after = storage.transactions.get(parent.id).unwrap().unwrap();
        assert_eq!(after.amount.cents(), -12000);
    }

    #[test]
    fn test_mismatch_ignores_tombstoned_children() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        let (_parent, children) = insert_split(&storage, account_id, &[-6000, -4000, -100]);
        // Kill the -100 child and shrink the parent to match the live ones
        let mut dead = children[2].clone();
        dead.tombstone = true;
        storage.transactions.upsert(dead).unwrap();
        let mut parent = storage.transactions.get(children[0].parent_id.unwrap()).unwrap().unwrap();
        parent.amount = Money::from_cents(-10000);
        storage.transactions.upsert(parent).unwrap();

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert!(report.mismatched_splits.is_empty());
    }

    #[test]
    fn test_same_side_transfer_category_cleared() {
        let (_temp_dir, storage) = create_test_storage();
        let checking = setup_account(&storage, "Checking", true);
        let savings = setup_account(&storage, "Savings", true);
        let brokerage = setup_account(&storage, "Brokerage", false);
        let category_id = setup_category(&storage);

        // On-budget -> on-budget transfer with a stray category: repaired
        let mut out1 = Transaction::new(checking, test_date(), Money::from_cents(-2500));
        let mut in1 = Transaction::new(savings, test_date(), Money::from_cents(2500));
        out1.transfer_id = Some(in1.id);
        in1.transfer_id = Some(out1.id);
        out1.category_id = Some(category_id);
        storage.transactions.upsert(out1.clone()).unwrap();
        storage.transactions.upsert(in1).unwrap();

        // On-budget -> off-budget transfer keeps its category
        let mut out2 = Transaction::new(checking, test_date(), Money::from_cents(-1000));
        let mut in2 = Transaction::new(brokerage, test_date(), Money::from_cents(1000));
        out2.transfer_id = Some(in2.id);
        in2.transfer_id = Some(out2.id);
        out2.category_id = Some(category_id);
        storage.transactions.upsert(out2.clone()).unwrap();
        storage.transactions.upsert(in2).unwrap();

        let report = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert_eq!(report.num_transfers_fixed, 1);

        assert!(storage
            .transactions
            .get(out1.id)
            .unwrap()
            .unwrap()
            .category_id
            .is_none());
        assert_eq!(
            storage.transactions.get(out2.id).unwrap().unwrap().category_id,
            Some(category_id)
        );
    }

    #[test]
    fn test_repair_is_idempotent() {
        let (_temp_dir, storage) = create_test_storage();
        let account_id = setup_account(&storage, "Checking", true);

        let (mut parent, _children) = insert_split(&storage, account_id, &[-6000, -4000]);
        parent.status = TransactionStatus::Cleared;
        parent.tombstone = true;
        storage.transactions.upsert(parent).unwrap();

        let first = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert!(!first.is_clean());

        let second = RepairService::new(&storage).fix_split_transactions().unwrap();
        assert!(second.is_clean());
    }
}
