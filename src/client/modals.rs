//! Modal stack
//!
//! Front-ends render whatever modal sits on top of this stack. The stack
//! itself is plain state: push/replace/pop/close plus `collapse`, which
//! cuts the stack back past a named modal. Options that are callbacks in
//! a UI layer are represented as data here.

use serde::{Deserialize, Serialize};

use crate::models::{AccountId, CategoryGroupId, CategoryId, Money, PayeeId, TransactionId, UserId};
use crate::services::banklink::ExternalAccount;

/// A modal and its options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Modal {
    /// Create (no id) or edit a user
    EditUser { user_id: Option<UserId> },
    /// Hand ownership to another user
    TransferOwnership,
    /// Start the bank-link flow
    BankLinkInit,
    /// Waiting on the external authorization page
    BankLinkExternalMsg { institution_id: Option<String> },
    /// Pick which discovered accounts to link
    SelectLinkedAccounts {
        requisition_id: String,
        accounts: Vec<ExternalAccount>,
    },
    /// Confirm unlinking an account
    ConfirmUnlinkAccount {
        account_id: AccountId,
        account_name: String,
    },
    /// Close an account; deletable only when it has no transactions
    CloseAccount {
        account_id: AccountId,
        balance: Money,
        can_delete: bool,
    },
    /// Confirm deleting a category or group, choosing a transfer target
    ConfirmCategoryDelete {
        category_id: Option<CategoryId>,
        group_id: Option<CategoryGroupId>,
    },
    /// Confirm deleting a transaction
    ConfirmTransactionDelete { transaction_id: TransactionId },
    /// Merge payees that are no longer used
    MergeUnusedPayees {
        payee_ids: Vec<PayeeId>,
        target_payee_id: PayeeId,
    },
    /// Create (or recreate) the end-to-end encryption key
    CreateEncryptionKey { recreate: bool },
    /// Re-enter the password for an existing encryption key
    FixEncryptionKey { has_existing_key: bool },
    /// Pick a backup to restore
    LoadBackup,
    /// Budget summary for a month ("YYYY-MM")
    BudgetSummary { month: String },
    /// Keyboard shortcut help
    Help,
}

impl Modal {
    /// The modal's wire name
    pub fn name(&self) -> &'static str {
        match self {
            Self::EditUser { .. } => "edit-user",
            Self::TransferOwnership => "transfer-ownership",
            Self::BankLinkInit => "bank-link-init",
            Self::BankLinkExternalMsg { .. } => "bank-link-external-msg",
            Self::SelectLinkedAccounts { .. } => "select-linked-accounts",
            Self::ConfirmUnlinkAccount { .. } => "confirm-unlink-account",
            Self::CloseAccount { .. } => "close-account",
            Self::ConfirmCategoryDelete { .. } => "confirm-category-delete",
            Self::ConfirmTransactionDelete { .. } => "confirm-transaction-delete",
            Self::MergeUnusedPayees { .. } => "merge-unused-payees",
            Self::CreateEncryptionKey { .. } => "create-encryption-key",
            Self::FixEncryptionKey { .. } => "fix-encryption-key",
            Self::LoadBackup => "load-backup",
            Self::BudgetSummary { .. } => "budget-summary",
            Self::Help => "help",
        }
    }
}

/// The modal stack and its visibility flag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModalStack {
    stack: Vec<Modal>,
    /// Hidden while the app shows a loading screen
    is_hidden: bool,
}

impl ModalStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a modal on top of the stack
    ///
    /// Special case: the help modal never opens on top of another modal.
    pub fn push(&mut self, modal: Modal) {
        if matches!(modal, Modal::Help) && !self.stack.is_empty() {
            return;
        }
        self.stack.push(modal);
    }

    /// Replace the whole stack with a single modal
    pub fn replace(&mut self, modal: Modal) {
        self.stack = vec![modal];
    }

    /// Close the top modal (no-op on an empty stack)
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Close every modal
    pub fn close_all(&mut self) {
        self.stack.clear();
    }

    /// Cut the stack back so the first modal named `root_name` and
    /// everything above it are closed
    ///
    /// An unknown name leaves the stack untouched.
    pub fn collapse(&mut self, root_name: &str) {
        if let Some(idx) = self.stack.iter().position(|m| m.name() == root_name) {
            self.stack.truncate(idx);
        }
    }

    /// The modal currently shown, if any
    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    /// How many modals are open
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True when no modal is open
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Hide or show the whole stack (driven by the app loading state)
    pub fn set_hidden(&mut self, hidden: bool) {
        self.is_hidden = hidden;
    }

    /// True while the stack is hidden behind a loading screen
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Reset to the initial state (used on sign-out)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
