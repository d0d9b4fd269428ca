//! Export row building and rendering

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};
use crate::storage::Storage;

/// One exported transaction row with names resolved
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub date: String,
    pub account: String,
    pub payee: String,
    pub category: String,
    pub memo: String,
    /// Amount in cents
    pub amount: i64,
    pub status: String,
    pub is_split: bool,
    pub is_transfer: bool,
}

/// Build export rows from the live register
fn build_rows(storage: &Storage) -> TallyResult<Vec<ExportRow>> {
    let account_names: HashMap<_, _> = storage
        .accounts
        .get_all(true)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let payee_names: HashMap<_, _> = storage
        .payees
        .get_all()?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let category_names: HashMap<_, _> = storage
        .categories
        .get_all_categories()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    fn lookup<K: std::hash::Hash + Eq>(map: &HashMap<K, String>, key: K) -> String {
        map.get(&key)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }

    let mut rows = Vec::new();
    for txn in storage.transactions.get_live()? {
        let category = if txn.is_transfer() {
            "Transfer".to_string()
        } else if txn.is_parent {
            "Split".to_string()
        } else if let Some(category_id) = txn.category_id {
            lookup(&category_names, category_id)
        } else {
            String::new()
        };

        rows.push(ExportRow {
            id: txn.id.to_string(),
            date: txn.date.format("%Y-%m-%d").to_string(),
            account: lookup(&account_names, txn.account_id),
            payee: txn
                .payee_id
                .map(|id| lookup(&payee_names, id))
                .unwrap_or_default(),
            category,
            memo: txn.memo.clone(),
            amount: txn.amount.cents(),
            status: txn.status.to_string(),
            is_split: txn.is_parent,
            is_transfer: txn.is_transfer(),
        });
    }

    Ok(rows)
}

/// Export all live transactions as CSV
pub fn transactions_csv(storage: &Storage) -> TallyResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in build_rows(storage)? {
        writer
            .serialize(row)
            .map_err(|e| TallyError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TallyError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TallyError::Export(e.to_string()))
}

/// Export all live transactions as pretty-printed JSON
pub fn transactions_json(storage: &Storage) -> TallyResult<String> {
    let rows = build_rows(storage)?;
    serde_json::to_string_pretty(&rows).map_err(|e| TallyError::Export(e.to_string()))
}

/// Export all live transactions as YAML
pub fn transactions_yaml(storage: &Storage) -> TallyResult<String> {
    let rows = build_rows(storage)?;
    serde_yaml::to_string(&rows).map_err(|e| TallyError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Account, Money, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let account = Account::new("Checking");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();

        let payee = storage.payees.get_or_create("Corner Store").unwrap();
        let mut txn = Transaction::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Money::from_cents(-1250),
        );
        txn.payee_id = Some(payee.id);
        txn.memo = "snacks".to_string();
        storage.transactions.upsert(txn).unwrap();

        // A tombstoned row that must not be exported
        let mut dead = Transaction::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
            Money::from_cents(-999),
        );
        dead.tombstone = true;
        storage.transactions.upsert(dead).unwrap();

        (temp_dir, storage)
    }

    #[test]
    fn test_csv_export() {
        let (_temp_dir, storage) = setup();
        let csv = transactions_csv(&storage).unwrap();

        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,date,account,payee"));

        let row = lines.next().unwrap();
        assert!(row.contains("Checking"));
        assert!(row.contains("Corner Store"));
        assert!(row.contains("-1250"));
        // Only the live row
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_json_export() {
        let (_temp_dir, storage) = setup();
        let json = transactions_json(&storage).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["payee"], "Corner Store");
    }

    #[test]
    fn test_yaml_export() {
        let (_temp_dir, storage) = setup();
        let yaml = transactions_yaml(&storage).unwrap();
        assert!(yaml.contains("payee: Corner Store"));
    }
}
