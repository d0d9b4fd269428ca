//! The RPC handler surface
//!
//! A registry maps string method names onto handlers that take and return
//! JSON values. Clients send `(method, payload)` pairs; a handler never
//! produces a transport fault — failures resolve as
//! `{"error": {"reason", "message"}}` payloads.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::backup::BackupManager;
use crate::config::Settings;
use crate::crypto;
use crate::error::{TallyError, TallyResult};
use crate::export;
use crate::models::{BudgetMonth, Money, User, UserRole};
use crate::services::banklink::BankLinkProvider;
use crate::services::import::ColumnMapping;
use crate::services::transaction::{CreateTransactionInput, SplitInput, TransactionPatch};
use crate::services::user::UserInput;
use crate::services::{
    AuthService, BankLinkService, BudgetService, CategoryService, ImportService, PayeeService,
    RepairService, TransactionService, UserService,
};
use crate::storage::Storage;

use super::reason;
use super::types::*;

/// Everything a handler can reach
pub struct ApiContext<'a> {
    pub storage: &'a Storage,
    pub settings: &'a mut Settings,
    pub provider: &'a dyn BankLinkProvider,
}

type HandlerFn = for<'a, 'b> fn(&'b mut ApiContext<'a>, Value) -> TallyResult<Value>;

/// String-keyed registry of handlers
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl HandlerRegistry {
    /// Build the registry with the full handler surface
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        // transactions
        registry.method("transaction-add", transaction_add);
        registry.method("transaction-update", transaction_update);
        registry.method("transaction-delete", transaction_delete);
        registry.method("transactions-batch-update", transactions_batch_update);
        registry.method("transactions-parse-file", transactions_parse_file);
        registry.method("transactions-export", transactions_export);

        // categories
        registry.method("get-categories", get_categories);
        registry.method("category-create", category_create);
        registry.method("category-update", category_update);
        registry.method("category-move", category_move);
        registry.method("category-delete", category_delete);
        registry.method("category-group-create", category_group_create);
        registry.method("category-group-update", category_group_update);
        registry.method("category-group-delete", category_group_delete);
        registry.method("must-category-transfer", must_category_transfer);

        // payees
        registry.method("payees-get", payees_get);
        registry.method("payee-create", payee_create);
        registry.method("common-payees-get", common_payees_get);
        registry.method("payees-merge", payees_merge);
        registry.method("payees-get-orphaned", payees_get_orphaned);

        // budget
        registry.method("get-budget-bounds", get_budget_bounds);
        registry.method("budget-month", budget_month);
        registry.method("budget-set-amount", budget_set_amount);
        registry.method("validate-budget-name", validate_budget_name);
        registry.method("unique-budget-name", unique_budget_name);

        // users
        registry.method("users-get", users_get);
        registry.method("user-add", user_add);
        registry.method("user-update", user_update);
        registry.method("user-delete-all", user_delete_all);

        // auth
        registry.method("needs-bootstrap", needs_bootstrap);
        registry.method("bootstrap", bootstrap);
        registry.method("sign-in", sign_in);
        registry.method("sign-out", sign_out);
        registry.method("change-password", change_password);
        registry.method("get-user", get_user);

        // encryption keys
        registry.method("key-make", key_make);
        registry.method("key-test", key_test);

        // tools
        registry.method("tools/fix-split-transactions", fix_split_transactions);

        // bank linking
        registry.method("banklink-create-web-token", banklink_create_web_token);
        registry.method("banklink-poll-web-token", banklink_poll_web_token);

        // backups
        registry.method("backups-get", backups_get);
        registry.method("backup-make", backup_make);
        registry.method("backup-load", backup_load);

        registry
    }

    /// Register a handler under a method name
    pub fn method(&mut self, name: &'static str, handler: HandlerFn) {
        self.handlers.insert(name, handler);
    }

    /// All registered method names, sorted
    pub fn methods(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run a method against the context
    ///
    /// Always resolves with a value; failures come back as
    /// `{"error": {"reason", "message"}}`.
    pub fn dispatch(&self, ctx: &mut ApiContext<'_>, method: &str, payload: Value) -> Value {
        let Some(handler) = self.handlers.get(method) else {
            return error_value(reason::UNKNOWN_METHOD);
        };

        match handler(ctx, payload) {
            Ok(value) => value,
            Err(err) => error_value(&reason::from_error(&err)),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the error payload for a reason code
fn error_value(code: &str) -> Value {
    json!({
        "error": {
            "reason": code,
            "message": reason::user_message(code),
        }
    })
}

/// Deserialize a request payload, rejecting malformed input
fn parse<T: DeserializeOwned>(payload: Value) -> TallyResult<T> {
    serde_json::from_value(payload).map_err(|_| TallyError::Reason(reason::INVALID_REQUEST))
}

fn to_value<T: serde::Serialize>(value: &T) -> TallyResult<Value> {
    serde_json::to_value(value).map_err(TallyError::from)
}

/// Resolve a token and require the admin role
fn require_admin(ctx: &ApiContext<'_>, token: &str) -> TallyResult<User> {
    let user = AuthService::new(ctx.storage).verify(token)?;
    if user.role != UserRole::Admin {
        return Err(TallyError::Reason(reason::UNAUTHORIZED));
    }
    Ok(user)
}

fn parse_month(s: &str) -> TallyResult<BudgetMonth> {
    s.parse()
        .map_err(|_| TallyError::Reason(reason::INVALID_REQUEST))
}

// ----- transactions -----

fn transaction_add(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionAddRequest = parse(payload)?;
    let service = TransactionService::new(ctx.storage);

    let input = CreateTransactionInput {
        account_id: req.account_id,
        date: req.date,
        amount: Money::from_cents(req.amount),
        payee_name: req.payee_name,
        category_id: req.category_id,
        memo: req.memo,
        status: None,
    };

    let txn = if req.splits.is_empty() {
        service.create(input)?
    } else {
        let splits = req
            .splits
            .into_iter()
            .map(|s| SplitInput {
                category_id: s.category_id,
                amount: Money::from_cents(s.amount),
                memo: s.memo,
            })
            .collect();
        service.create_split(input, splits)?
    };

    Ok(json!({ "id": txn.id }))
}

fn patch_from_request(req: TransactionUpdateRequest) -> TransactionPatch {
    let mut patch = TransactionPatch::new(req.id);
    patch.date = req.date;
    patch.amount = req.amount.map(Money::from_cents);
    patch.payee_id = req.payee_id;
    patch.category_id = req.category_id;
    patch.memo = req.memo;
    patch
}

fn transaction_update(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionUpdateRequest = parse(payload)?;
    let txn = TransactionService::new(ctx.storage).update(patch_from_request(req))?;
    to_value(&txn)
}

fn transaction_delete(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionDeleteRequest = parse(payload)?;
    TransactionService::new(ctx.storage).delete(req.id)?;
    Ok(json!({}))
}

fn transactions_batch_update(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionsBatchUpdateRequest = parse(payload)?;
    let patches = req.updates.into_iter().map(patch_from_request).collect();
    let updated = TransactionService::new(ctx.storage).batch_update(patches)?;
    Ok(json!({ "updated": updated.len() }))
}

fn transactions_parse_file(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionsParseFileRequest = parse(payload)?;
    let mut mapping = ColumnMapping {
        has_header: req.has_header,
        ..ColumnMapping::default()
    };
    if let Some(format) = req.date_format {
        mapping.date_format = format;
    }

    let result = ImportService::new(ctx.storage)
        .parse_csv_file(std::path::Path::new(&req.filepath), &mapping)?;
    to_value(&result)
}

fn transactions_export(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TransactionsExportRequest = parse(payload)?;
    let data = match req.format.as_str() {
        "csv" => export::transactions_csv(ctx.storage)?,
        "json" => export::transactions_json(ctx.storage)?,
        "yaml" => export::transactions_yaml(ctx.storage)?,
        _ => return Err(TallyError::Reason(reason::INVALID_REQUEST)),
    };
    to_value(&TransactionsExportResponse { data })
}

// ----- categories -----

fn get_categories(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    let service = CategoryService::new(ctx.storage);
    Ok(json!({
        "grouped": service.list_grouped()?,
        "list": service.list()?,
    }))
}

fn category_create(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryCreateRequest = parse(payload)?;
    let category = CategoryService::new(ctx.storage).create(&req.name, req.group_id)?;
    Ok(json!({ "id": category.id }))
}

fn category_update(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryUpdateRequest = parse(payload)?;
    let category =
        CategoryService::new(ctx.storage).update(req.id, req.name.as_deref(), req.hidden)?;
    to_value(&category)
}

fn category_move(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryMoveRequest = parse(payload)?;
    let category = CategoryService::new(ctx.storage).move_to_group(req.id, req.group_id)?;
    to_value(&category)
}

fn category_delete(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryDeleteRequest = parse(payload)?;
    CategoryService::new(ctx.storage).delete_category(req.id, req.transfer_id)?;
    Ok(json!({}))
}

fn category_group_create(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryGroupCreateRequest = parse(payload)?;
    let group = CategoryService::new(ctx.storage).create_group(&req.name, req.is_income)?;
    Ok(json!({ "id": group.id }))
}

fn category_group_update(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryGroupUpdateRequest = parse(payload)?;
    let group = CategoryService::new(ctx.storage).update_group(req.id, &req.name)?;
    to_value(&group)
}

fn category_group_delete(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CategoryGroupDeleteRequest = parse(payload)?;
    CategoryService::new(ctx.storage).delete_group(req.id, req.transfer_id)?;
    Ok(json!({}))
}

fn must_category_transfer(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: MustCategoryTransferRequest = parse(payload)?;
    let must = CategoryService::new(ctx.storage).must_transfer(req.id)?;
    Ok(json!(must))
}

// ----- payees -----

fn payees_get(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    to_value(&PayeeService::new(ctx.storage).list()?)
}

fn payee_create(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PayeeCreateRequest = parse(payload)?;
    let payee = PayeeService::new(ctx.storage).create(&req.name)?;
    Ok(json!({ "id": payee.id }))
}

fn common_payees_get(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CommonPayeesRequest = parse(payload)?;
    to_value(&PayeeService::new(ctx.storage).list_common(req.limit)?)
}

fn payees_merge(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PayeesMergeRequest = parse(payload)?;
    let merged = PayeeService::new(ctx.storage).merge(req.target_id, &req.merge_ids)?;
    Ok(json!({ "merged": merged }))
}

fn payees_get_orphaned(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    to_value(&PayeeService::new(ctx.storage).get_orphaned()?)
}

// ----- budget -----

fn get_budget_bounds(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    let bounds = BudgetService::new(ctx.storage).bounds()?;
    Ok(json!({
        "start": bounds.start.to_string(),
        "end": bounds.end.to_string(),
    }))
}

fn budget_month(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: BudgetMonthRequest = parse(payload)?;
    let month = parse_month(&req.month)?;
    to_value(&BudgetService::new(ctx.storage).month_values(month)?)
}

fn budget_set_amount(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: BudgetSetAmountRequest = parse(payload)?;
    let month = parse_month(&req.month)?;
    BudgetService::new(ctx.storage).set_amount(
        month,
        req.category_id,
        Money::from_cents(req.amount),
    )?;
    Ok(json!({}))
}

fn validate_budget_name(_ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: ValidateBudgetNameRequest = parse(payload)?;
    let message = crate::services::budget::validate_budget_name(&req.name);
    to_value(&ValidateBudgetNameResponse {
        valid: message.is_none(),
        message,
    })
}

fn unique_budget_name(_ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: UniqueBudgetNameRequest = parse(payload)?;
    Ok(json!(crate::services::budget::unique_budget_name(
        &req.name,
        &req.existing
    )))
}

// ----- users -----

fn users_get(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: UsersGetRequest = parse(payload)?;
    require_admin(ctx, &req.token)?;
    to_value(&UserService::new(ctx.storage).list_window(&req.filter, req.page)?)
}

fn user_add(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: UserAddRequest = parse(payload)?;
    require_admin(ctx, &req.token)?;

    let user = UserService::new(ctx.storage).create(UserInput {
        user_name: req.user_name,
        display_name: req.display_name,
        role: req.role,
        enabled: req.enabled,
    })?;
    Ok(json!({ "id": user.id }))
}

fn user_update(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: UserUpdateRequest = parse(payload)?;
    require_admin(ctx, &req.token)?;

    let user = UserService::new(ctx.storage).update(
        req.id,
        UserInput {
            user_name: req.user_name,
            display_name: req.display_name,
            role: req.role,
            enabled: req.enabled,
        },
    )?;
    to_value(&user)
}

fn user_delete_all(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: UserDeleteAllRequest = parse(payload)?;
    require_admin(ctx, &req.token)?;

    let result = UserService::new(ctx.storage).delete_all(&req.ids)?;
    to_value(&UserDeleteAllResponse {
        deleted: result.deleted,
        some_deletions_failed: result.some_deletions_failed,
    })
}

// ----- auth -----

fn needs_bootstrap(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    Ok(json!({
        "bootstrapped": !AuthService::new(ctx.storage).needs_bootstrap()?,
    }))
}

fn bootstrap(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PasswordRequest = parse(payload)?;
    AuthService::new(ctx.storage).bootstrap(&req.password)?;
    Ok(json!({}))
}

fn sign_in(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PasswordRequest = parse(payload)?;
    let session = AuthService::new(ctx.storage).sign_in(&req.password)?;
    to_value(&SignInResponse {
        token: session.token,
    })
}

fn sign_out(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TokenRequest = parse(payload)?;
    AuthService::new(ctx.storage).sign_out(&req.token)?;
    Ok(json!("ok"))
}

fn change_password(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: ChangePasswordRequest = parse(payload)?;
    AuthService::new(ctx.storage).change_password(&req.token, &req.password)?;
    Ok(json!({}))
}

fn get_user(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: TokenRequest = parse(payload)?;
    let user = AuthService::new(ctx.storage).verify(&req.token)?;
    to_value(&GetUserResponse {
        user_id: user.id,
        user_name: user.user_name.clone(),
        display_name: user.shown_name().to_string(),
        role: user.role.to_string(),
    })
}

// ----- encryption keys -----

fn key_make(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: KeyMakeRequest = parse(payload)?;
    crypto::make_key(&mut ctx.settings.encryption, &req.password, req.recreate)?;
    ctx.settings.save(ctx.storage.paths())?;
    Ok(json!({}))
}

fn key_test(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PasswordRequest = parse(payload)?;
    let matches = crypto::test_key(&ctx.settings.encryption, &req.password)?;
    to_value(&KeyTestResponse { matches })
}

// ----- tools -----

fn fix_split_transactions(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    to_value(&RepairService::new(ctx.storage).fix_split_transactions()?)
}

// ----- bank linking -----

fn banklink_create_web_token(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: CreateWebTokenRequest = parse(payload)?;
    let token = BankLinkService::new(ctx.storage, ctx.provider)
        .create_web_token(&req.institution_id, req.access_valid_for_days)?;
    to_value(&token)
}

fn banklink_poll_web_token(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: PollWebTokenRequest = parse(payload)?;
    let accounts =
        BankLinkService::new(ctx.storage, ctx.provider).poll_web_token(&req.requisition_id)?;
    Ok(json!({
        "requisition_id": req.requisition_id,
        "accounts": accounts,
    }))
}

// ----- backups -----

fn backups_get(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    let manager = BackupManager::new(
        ctx.storage.paths().clone(),
        ctx.settings.backup_retention.clone(),
    );
    to_value(&manager.list_backups()?)
}

fn backup_make(ctx: &mut ApiContext<'_>, _payload: Value) -> TallyResult<Value> {
    let manager = BackupManager::new(
        ctx.storage.paths().clone(),
        ctx.settings.backup_retention.clone(),
    );
    let info = manager.create_backup()?;
    to_value(&info)
}

fn backup_load(ctx: &mut ApiContext<'_>, payload: Value) -> TallyResult<Value> {
    let req: BackupLoadRequest = parse(payload)?;
    let manager = BackupManager::new(
        ctx.storage.paths().clone(),
        ctx.settings.backup_retention.clone(),
    );
    manager.restore(&req.backup_id)?;
    ctx.storage.load_all()?;
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::services::banklink::UnconfiguredProvider;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        storage: Storage,
        settings: Settings,
        registry: HandlerRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
            let storage = Storage::new(paths).unwrap();
            storage.load_all().unwrap();

            Self {
                _temp_dir: temp_dir,
                storage,
                settings: Settings::default(),
                registry: HandlerRegistry::new(),
            }
        }

        fn call(&mut self, method: &str, payload: Value) -> Value {
            let mut ctx = ApiContext {
                storage: &self.storage,
                settings: &mut self.settings,
                provider: &UnconfiguredProvider,
            };
            self.registry.dispatch(&mut ctx, method, payload)
        }

        fn sign_in_admin(&mut self) -> String {
            self.call("bootstrap", json!({"password": "hunter2"}));
            let resp = self.call("sign-in", json!({"password": "hunter2"}));
            resp["token"].as_str().unwrap().to_string()
        }
    }

    fn reason_of(value: &Value) -> Option<&str> {
        value.get("error")?.get("reason")?.as_str()
    }

    #[test]
    fn test_unknown_method() {
        let mut fx = Fixture::new();
        let resp = fx.call("no-such-method", json!({}));
        assert_eq!(reason_of(&resp), Some(reason::UNKNOWN_METHOD));
    }

    #[test]
    fn test_malformed_payload() {
        let mut fx = Fixture::new();
        let resp = fx.call("payee-create", json!({"wrong": "shape"}));
        assert_eq!(reason_of(&resp), Some(reason::INVALID_REQUEST));
    }

    #[test]
    fn test_error_payload_carries_message() {
        let mut fx = Fixture::new();
        let resp = fx.call("users-get", json!({"token": "bogus"}));
        assert_eq!(reason_of(&resp), Some(reason::UNAUTHORIZED));
        assert_eq!(
            resp["error"]["message"].as_str().unwrap(),
            "You are not logged in."
        );
    }

    #[test]
    fn test_category_flow() {
        let mut fx = Fixture::new();

        let group = fx.call("category-group-create", json!({"name": "Bills"}));
        let group_id = group["id"].as_str().unwrap().to_string();

        let category = fx.call(
            "category-create",
            json!({"name": "Electric", "group_id": group_id}),
        );
        assert!(category["id"].is_string());

        let listed = fx.call("get-categories", json!({}));
        assert_eq!(listed["grouped"].as_array().unwrap().len(), 1);
        assert_eq!(listed["list"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_user_directory_flow() {
        let mut fx = Fixture::new();
        let token = fx.sign_in_admin();

        let added = fx.call(
            "user-add",
            json!({"token": &token, "user_name": "alice", "role": "basic"}),
        );
        let alice_id = added["id"].as_str().unwrap().to_string();

        // Duplicate rejected with its reason code
        let dup = fx.call(
            "user-add",
            json!({"token": &token, "user_name": "alice", "role": "basic"}),
        );
        assert_eq!(reason_of(&dup), Some(reason::USER_ALREADY_EXISTS));

        let listed = fx.call("users-get", json!({"token": &token}));
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let deleted = fx.call(
            "user-delete-all",
            json!({"token": &token, "ids": [alice_id]}),
        );
        assert_eq!(deleted["deleted"], 1);
        assert_eq!(deleted["some_deletions_failed"], false);
    }

    #[test]
    fn test_users_get_requires_token() {
        let mut fx = Fixture::new();
        fx.sign_in_admin();

        let resp = fx.call("users-get", json!({"token": "made-up"}));
        assert_eq!(reason_of(&resp), Some(reason::UNAUTHORIZED));
    }

    #[test]
    fn test_fix_split_transactions_reports_counts() {
        let mut fx = Fixture::new();
        let resp = fx.call("tools/fix-split-transactions", json!({}));
        assert_eq!(resp["num_blank_payees"], 0);
        assert_eq!(resp["num_cleared"], 0);
        assert_eq!(resp["num_deleted"], 0);
        assert_eq!(resp["num_transfers_fixed"], 0);
        assert!(resp["mismatched_splits"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_budget_name_helpers() {
        let mut fx = Fixture::new();

        let valid = fx.call("validate-budget-name", json!({"name": "My Budget"}));
        assert_eq!(valid["valid"], true);

        let invalid = fx.call("validate-budget-name", json!({"name": "bad/name"}));
        assert_eq!(invalid["valid"], false);
        assert!(invalid["message"].is_string());

        let unique = fx.call(
            "unique-budget-name",
            json!({"name": "My Budget", "existing": ["My Budget"]}),
        );
        assert_eq!(unique, json!("My Budget 2"));
    }

    #[test]
    fn test_key_make_and_test() {
        let mut fx = Fixture::new();

        fx.call("key-make", json!({"password": "secret"}));
        let good = fx.call("key-test", json!({"password": "secret"}));
        assert_eq!(good["matches"], true);

        let bad = fx.call("key-test", json!({"password": "wrong"}));
        assert_eq!(bad["matches"], false);
    }

    #[test]
    fn test_banklink_unconfigured() {
        let mut fx = Fixture::new();
        let resp = fx.call(
            "banklink-create-web-token",
            json!({"institution_id": "my-bank"}),
        );
        assert_eq!(reason_of(&resp), Some("bank-link-unconfigured"));
    }
}
