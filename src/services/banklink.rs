//! Bank-linking authorization flow
//!
//! Linking an account to a bank happens in two steps, mirroring the
//! provider's requisition model:
//!
//! 1. `create_web_token` asks the provider for a requisition: an
//!    authorization link the user opens in a browser, plus a requisition
//!    id to poll on.
//! 2. `poll_web_token` polls the requisition until the user finishes the
//!    external authorization. It resolves with the discovered bank
//!    accounts, or with `timeout` / `token-expired` when the wait or the
//!    requisition runs out.
//!
//! The provider itself sits behind [`BankLinkProvider`] so the whole flow
//! runs in tests without a network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Account, AccountId, BankLink, SyncSource};
use crate::storage::Storage;

/// A bank account discovered during authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAccount {
    /// The provider's id for this account
    pub id: String,
    /// Account display name
    pub name: String,
    /// IBAN when the provider exposes one
    pub iban: Option<String>,
    /// ISO currency code
    pub currency: String,
}

/// A freshly created requisition: the link to open plus the id to poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebToken {
    pub link: String,
    pub requisition_id: String,
}

/// Where a requisition currently stands
#[derive(Debug, Clone)]
pub enum RequisitionStatus {
    /// The user has not finished the external authorization yet
    Pending,
    /// Authorization finished; these accounts were discovered
    Linked(Vec<ExternalAccount>),
    /// The requisition expired before authorization finished
    Expired,
}

/// External bank-link provider (GoCardless-style)
pub trait BankLinkProvider {
    /// Create a requisition for an institution
    fn create_requisition(
        &self,
        institution_id: &str,
        access_valid_for_days: u32,
    ) -> TallyResult<WebToken>;

    /// Check where a requisition stands
    fn requisition_status(&self, requisition_id: &str) -> TallyResult<RequisitionStatus>;
}

/// Placeholder provider used when no bank-link credentials are configured
///
/// Every call fails with a `bank-link-unconfigured` reason so the flow
/// surfaces a clear error instead of hanging.
pub struct UnconfiguredProvider;

impl BankLinkProvider for UnconfiguredProvider {
    fn create_requisition(
        &self,
        _institution_id: &str,
        _access_valid_for_days: u32,
    ) -> TallyResult<WebToken> {
        Err(TallyError::Reason("bank-link-unconfigured"))
    }

    fn requisition_status(&self, _requisition_id: &str) -> TallyResult<RequisitionStatus> {
        Err(TallyError::Reason("bank-link-unconfigured"))
    }
}

/// How poll_web_token waits
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between status checks
    pub interval: Duration,
    /// Attempts before giving up with `timeout`
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 100,
        }
    }
}

/// Service driving the bank-link flow
pub struct BankLinkService<'a> {
    storage: &'a Storage,
    provider: &'a dyn BankLinkProvider,
    poll: PollConfig,
}

impl<'a> BankLinkService<'a> {
    /// Create a new bank-link service
    pub fn new(storage: &'a Storage, provider: &'a dyn BankLinkProvider) -> Self {
        Self {
            storage,
            provider,
            poll: PollConfig::default(),
        }
    }

    /// Override the polling cadence
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Step 1: create a requisition for the institution
    pub fn create_web_token(
        &self,
        institution_id: &str,
        access_valid_for_days: u32,
    ) -> TallyResult<WebToken> {
        if institution_id.trim().is_empty() {
            return Err(TallyError::Validation(
                "Institution id cannot be empty".into(),
            ));
        }
        self.provider
            .create_requisition(institution_id, access_valid_for_days)
    }

    /// Step 2: wait for the external authorization to finish
    ///
    /// Reason codes: `timeout` when polling gives up, `token-expired` when
    /// the requisition expired, `unknown` for provider failures.
    pub fn poll_web_token(&self, requisition_id: &str) -> TallyResult<Vec<ExternalAccount>> {
        for attempt in 0..self.poll.max_attempts {
            match self.provider.requisition_status(requisition_id) {
                Ok(RequisitionStatus::Linked(accounts)) => return Ok(accounts),
                Ok(RequisitionStatus::Expired) => {
                    return Err(TallyError::Reason("token-expired"))
                }
                Ok(RequisitionStatus::Pending) => {}
                Err(_) => return Err(TallyError::Reason("unknown")),
            }

            // Sleep between attempts, not after the last one
            if attempt + 1 < self.poll.max_attempts {
                std::thread::sleep(self.poll.interval);
            }
        }

        Err(TallyError::Reason("timeout"))
    }

    /// Link a discovered bank account to a local account
    ///
    /// With `existing` the link is attached to that account; otherwise a
    /// new local account named after the external one is created.
    pub fn link_account(
        &self,
        external: &ExternalAccount,
        requisition_id: &str,
        existing: Option<AccountId>,
    ) -> TallyResult<Account> {
        if let Some(already) = self.storage.accounts.find_by_external_id(&external.id)? {
            return Err(TallyError::Duplicate {
                entity_type: "Account",
                identifier: format!("{} (linked to {})", external.id, already.name),
            });
        }

        let mut account = match existing {
            Some(id) => self
                .storage
                .accounts
                .get(id)?
                .ok_or_else(|| TallyError::account_not_found(id.to_string()))?,
            None => Account::new(external.name.clone()),
        };

        account.link(BankLink {
            sync_source: SyncSource::GoCardless,
            external_id: external.id.clone(),
            requisition_id: requisition_id.to_string(),
        });

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
            &account,
            Some(format!("linked to external account {}", external.id)),
        )?;

        Ok(account)
    }

    /// Remove the bank link from an account
    pub fn unlink_account(&self, id: AccountId) -> TallyResult<Account> {
        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| TallyError::account_not_found(id.to_string()))?;

        let before = account.clone();
        account.unlink();

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
            Some("unlinked".to_string()),
        )?;

        Ok(account)
    }
}
