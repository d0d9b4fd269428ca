//! Request and response shapes for the handler surface
//!
//! Requests deserialize from the JSON payload a client sends with a
//! method name; responses serialize back into the resolved payload.
//! Failures are not transport faults: they resolve as
//! `{"error": {"reason": ...}}` values (see [`super::reason`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AccountId, CategoryGroupId, CategoryId, PayeeId, TransactionId, UserId};

fn default_true() -> bool {
    true
}

// ----- transactions -----

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionAddRequest {
    pub account_id: AccountId,
    pub date: NaiveDate,
    /// Amount in cents
    pub amount: i64,
    pub payee_name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub memo: Option<String>,
    /// Split portions; two or more turn this into a split transaction
    #[serde(default)]
    pub splits: Vec<SplitRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitRequest {
    pub category_id: CategoryId,
    pub amount: i64,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionUpdateRequest {
    pub id: TransactionId,
    pub date: Option<NaiveDate>,
    pub amount: Option<i64>,
    /// `Some(None)` clears the payee
    #[serde(default, with = "double_option")]
    pub payee_id: Option<Option<PayeeId>>,
    /// `Some(None)` clears the category
    #[serde(default, with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDeleteRequest {
    pub id: TransactionId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsBatchUpdateRequest {
    pub updates: Vec<TransactionUpdateRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsParseFileRequest {
    pub filepath: String,
    /// chrono date format; defaults to ISO
    pub date_format: Option<String>,
    #[serde(default = "default_true")]
    pub has_header: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsExportRequest {
    /// "csv", "json" or "yaml"
    pub format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsExportResponse {
    pub data: String,
}

// ----- categories -----

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    pub group_id: CategoryGroupId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryUpdateRequest {
    pub id: CategoryId,
    pub name: Option<String>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMoveRequest {
    pub id: CategoryId,
    pub group_id: CategoryGroupId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDeleteRequest {
    pub id: CategoryId,
    pub transfer_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroupCreateRequest {
    pub name: String,
    #[serde(default)]
    pub is_income: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroupUpdateRequest {
    pub id: CategoryGroupId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroupDeleteRequest {
    pub id: CategoryGroupId,
    pub transfer_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MustCategoryTransferRequest {
    pub id: CategoryId,
}

// ----- payees -----

#[derive(Debug, Clone, Deserialize)]
pub struct PayeeCreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonPayeesRequest {
    #[serde(default = "default_common_limit")]
    pub limit: usize,
}

fn default_common_limit() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayeesMergeRequest {
    pub target_id: PayeeId,
    pub merge_ids: Vec<PayeeId>,
}

// ----- budget -----

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetMonthRequest {
    /// "YYYY-MM"
    pub month: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetSetAmountRequest {
    pub month: String,
    pub category_id: CategoryId,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateBudgetNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateBudgetNameResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniqueBudgetNameRequest {
    pub name: String,
    #[serde(default)]
    pub existing: Vec<String>,
}

// ----- users -----

#[derive(Debug, Clone, Deserialize)]
pub struct UsersGetRequest {
    pub token: String,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub page: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAddRequest {
    pub token: String,
    pub user_name: String,
    #[serde(default)]
    pub display_name: String,
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdateRequest {
    pub token: String,
    pub id: UserId,
    pub user_name: String,
    #[serde(default)]
    pub display_name: String,
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDeleteAllRequest {
    pub token: String,
    pub ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDeleteAllResponse {
    pub deleted: usize,
    pub some_deletions_failed: bool,
}

// ----- auth -----

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUserResponse {
    pub user_id: UserId,
    pub user_name: String,
    pub display_name: String,
    pub role: String,
}

// ----- encryption keys -----

#[derive(Debug, Clone, Deserialize)]
pub struct KeyMakeRequest {
    pub password: String,
    #[serde(default)]
    pub recreate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyTestResponse {
    pub matches: bool,
}

// ----- bank linking -----

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebTokenRequest {
    pub institution_id: String,
    #[serde(default = "default_access_days")]
    pub access_valid_for_days: u32,
}

fn default_access_days() -> u32 {
    90
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollWebTokenRequest {
    pub requisition_id: String,
}

// ----- backups -----

#[derive(Debug, Clone, Deserialize)]
pub struct BackupLoadRequest {
    pub backup_id: String,
}

/// serde adapter distinguishing a missing field from an explicit null
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        // Field absent: no change
        let req: TransactionUpdateRequest = serde_json::from_value(json!({
            "id": uuid::Uuid::new_v4().to_string(),
        }))
        .unwrap();
        assert!(req.category_id.is_none());

        // Explicit null: clear
        let req: TransactionUpdateRequest = serde_json::from_value(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "category_id": null,
        }))
        .unwrap();
        assert_eq!(req.category_id, Some(None));
    }

    #[test]
    fn test_defaults() {
        let req: CreateWebTokenRequest = serde_json::from_value(json!({
            "institution_id": "my-bank",
        }))
        .unwrap();
        assert_eq!(req.access_valid_for_days, 90);

        let req: UsersGetRequest = serde_json::from_value(json!({
            "token": "t",
        }))
        .unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.filter, "");
    }
}
