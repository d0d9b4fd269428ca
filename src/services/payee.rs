//! Payee service
//!
//! Payee listing and maintenance: merging duplicates, finding orphans,
//! and the most-recently-used listing.

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Payee, PayeeId};
use crate::storage::Storage;

use super::transaction::TransactionPatch;
use super::TransactionService;

/// Service for payee management
pub struct PayeeService<'a> {
    storage: &'a Storage,
}

impl<'a> PayeeService<'a> {
    /// Create a new payee service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a payee by name, reusing an existing one with the same name
    pub fn create(&self, name: &str) -> TallyResult<Payee> {
        let existed = self.storage.payees.get_by_name(name)?.is_some();
        let mut payee = self.storage.payees.get_or_create(name)?;

        if !existed {
            payee.manual = true;
            self.storage.payees.upsert(payee.clone())?;
            self.storage.payees.save()?;
            self.storage.log_create(
                EntityType::Payee,
                payee.id.to_string(),
                Some(payee.name.clone()),
                &payee,
            )?;
        }

        Ok(payee)
    }

    /// Get a payee by ID
    pub fn get(&self, id: PayeeId) -> TallyResult<Option<Payee>> {
        self.storage.payees.get(id)
    }

    /// List all payees sorted by name
    pub fn list(&self) -> TallyResult<Vec<Payee>> {
        self.storage.payees.get_all()
    }

    /// List payees ranked by recency of use, most recent first
    ///
    /// Payees that were never used come last, then alphabetical.
    pub fn list_common(&self, limit: usize) -> TallyResult<Vec<Payee>> {
        let mut payees = self.storage.payees.get_all()?;
        payees.sort_by(|a, b| {
            b.last_used_at
                .cmp(&a.last_used_at)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        payees.truncate(limit);
        Ok(payees)
    }

    /// Merge payees into `target_id`: live transactions are re-pointed,
    /// usage history is folded in, and the merged payees are deleted
    pub fn merge(&self, target_id: PayeeId, merge_ids: &[PayeeId]) -> TallyResult<usize> {
        let mut target = self
            .storage
            .payees
            .get(target_id)?
            .ok_or_else(|| TallyError::payee_not_found(target_id.to_string()))?;

        let transactions = TransactionService::new(self.storage);
        let mut merged = 0;

        for &merge_id in merge_ids {
            if merge_id == target_id {
                continue;
            }
            let Some(merge_payee) = self.storage.payees.get(merge_id)? else {
                continue;
            };

            // Re-point every row that references the merged payee
            let patches: Vec<TransactionPatch> = self
                .storage
                .transactions
                .get_all()?
                .into_iter()
                .filter(|t| t.payee_id == Some(merge_id))
                .map(|t| {
                    let mut patch = TransactionPatch::new(t.id);
                    patch.payee_id = Some(Some(target_id));
                    patch
                })
                .collect();
            transactions.batch_update(patches)?;

            // Fold usage history into the target
            for (category_id, count) in merge_payee.category_frequency {
                *target.category_frequency.entry(category_id).or_insert(0) += count;
            }
            if merge_payee.last_used_at > target.last_used_at {
                target.last_used_at = merge_payee.last_used_at;
            }

            self.storage.payees.delete(merge_id)?;
            merged += 1;
        }

        self.storage.payees.upsert(target.clone())?;
        self.storage.payees.save()?;

        self.storage.log_update(
            EntityType::Payee,
            target_id.to_string(),
            Some(target.name.clone()),
            &target,
            &target,
            Some(format!("merged {} payees", merged)),
        )?;

        Ok(merged)
    }

    /// Payees referenced by no live transaction
    pub fn get_orphaned(&self) -> TallyResult<Vec<Payee>> {
        let referenced: std::collections::HashSet<PayeeId> = self
            .storage
            .transactions
            .get_live()?
            .into_iter()
            .filter_map(|t| t.payee_id)
            .collect();

        Ok(self
            .storage
            .payees
            .get_all()?
            .into_iter()
            .filter(|p| !referenced.contains(&p.id))
            .collect())
    }

    /// Check which of the given payees are orphaned
    pub fn check_orphaned(&self, ids: &[PayeeId]) -> TallyResult<Vec<PayeeId>> {
        let orphaned: std::collections::HashSet<PayeeId> =
            self.get_orphaned()?.into_iter().map(|p| p.id).collect();
        Ok(ids.iter().copied().filter(|id| orphaned.contains(id)).collect())
    }

    /// Count payees
    pub fn count(&self) -> TallyResult<usize> {
        self.storage.payees.count()
    }
}
