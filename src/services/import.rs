//! CSV transaction import
//!
//! Parses bank-exported CSV files into transactions, with duplicate
//! detection against previously imported rows.

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;

use crate::error::{TallyError, TallyResult};
use crate::models::{AccountId, Money};
use crate::storage::Storage;

use super::transaction::{CreateTransactionInput, TransactionService};

/// How CSV columns map onto transaction fields
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub date: usize,
    pub payee: usize,
    pub amount: usize,
    pub memo: Option<usize>,
    /// chrono format string for the date column
    pub date_format: String,
    pub has_header: bool,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        // Date,Payee,Amount[,Memo]
        Self {
            date: 0,
            payee: 1,
            amount: 2,
            memo: Some(3),
            date_format: "%Y-%m-%d".to_string(),
            has_header: true,
        }
    }
}

/// One successfully parsed row
#[derive(Debug, Clone, Serialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub payee: String,
    pub amount: Money,
    pub memo: String,
    /// Stable id for duplicate detection
    pub import_id: String,
}

impl ParsedTransaction {
    fn new(date: NaiveDate, payee: String, amount: Money, memo: String) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        date.hash(&mut hasher);
        amount.cents().hash(&mut hasher);
        payee.hash(&mut hasher);
        let import_id = format!("imp-{:016x}", hasher.finish());

        Self {
            date,
            payee,
            amount,
            memo,
            import_id,
        }
    }
}

/// Result of parsing a CSV file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseFileResult {
    pub transactions: Vec<ParsedTransaction>,
    /// Row-level problems, as "line N: message"
    pub errors: Vec<String>,
}

/// Result of importing parsed rows
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub added: usize,
    pub skipped_duplicates: usize,
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    /// Create a new import service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse CSV from a reader
    ///
    /// Unparseable rows are collected into `errors` instead of aborting
    /// the file.
    pub fn parse_csv<R: std::io::Read>(
        &self,
        reader: R,
        mapping: &ColumnMapping,
    ) -> TallyResult<ParseFileResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(mapping.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut result = ParseFileResult::default();
        let first_data_line = if mapping.has_header { 2 } else { 1 };

        for (i, record) in csv_reader.records().enumerate() {
            let line = first_data_line + i;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    result.errors.push(format!("line {}: {}", line, e));
                    continue;
                }
            };

            match parse_record(&record, mapping) {
                Ok(parsed) => result.transactions.push(parsed),
                Err(e) => result.errors.push(format!("line {}: {}", line, e)),
            }
        }

        Ok(result)
    }

    /// Parse a CSV file from disk
    pub fn parse_csv_file(
        &self,
        path: &std::path::Path,
        mapping: &ColumnMapping,
    ) -> TallyResult<ParseFileResult> {
        let file = std::fs::File::open(path)
            .map_err(|e| TallyError::Import(format!("Failed to open {}: {}", path.display(), e)))?;
        self.parse_csv(file, mapping)
    }

    /// Import parsed rows into an account, skipping duplicates
    pub fn import(
        &self,
        account_id: AccountId,
        parsed: &[ParsedTransaction],
    ) -> TallyResult<ImportResult> {
        let transactions = TransactionService::new(self.storage);
        let mut result = ImportResult::default();

        for row in parsed {
            if self
                .storage
                .transactions
                .find_by_import_id(&row.import_id)?
                .is_some()
            {
                result.skipped_duplicates += 1;
                continue;
            }

            let mut txn = transactions.create(CreateTransactionInput {
                account_id,
                date: row.date,
                amount: row.amount,
                payee_name: Some(row.payee.clone()),
                category_id: None,
                memo: Some(row.memo.clone()),
                status: None,
            })?;
            txn.import_id = Some(row.import_id.clone());
            self.storage.transactions.upsert(txn)?;
            result.added += 1;
        }

        self.storage.transactions.save()?;
        Ok(result)
    }
}

fn parse_record(record: &StringRecord, mapping: &ColumnMapping) -> Result<ParsedTransaction, String> {
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

    let date_str = field(mapping.date);
    let date = NaiveDate::parse_from_str(date_str, &mapping.date_format)
        .map_err(|_| format!("invalid date '{}'", date_str))?;

    let amount_str = field(mapping.amount);
    let amount = Money::parse(amount_str).map_err(|_| format!("invalid amount '{}'", amount_str))?;

    let payee = field(mapping.payee).to_string();
    let memo = mapping
        .memo
        .map(|idx| field(idx).to_string())
        .unwrap_or_default();

    Ok(ParsedTransaction::new(date, payee, amount, memo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Account;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage, AccountId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let account = Account::new("Checking");
        let account_id = account.id;
        storage.accounts.upsert(account).unwrap();

        (temp_dir, storage, account_id)
    }

    const CSV: &str = "\
Date,Payee,Amount,Memo
2025-01-10,Corner Store,-12.50,snacks
2025-01-11,Employer,1500.00,
not-a-date,Broken,-1.00,
2025-01-12,Cafe,-4.25,coffee
";

    #[test]
    fn test_parse_collects_rows_and_errors() {
        let (_temp_dir, storage, _account_id) = create_test_storage();
        let service = ImportService::new(&storage);

        let result = service
            .parse_csv(CSV.as_bytes(), &ColumnMapping::default())
            .unwrap();

        assert_eq!(result.transactions.len(), 3);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("line 4:"));

        let first = &result.transactions[0];
        assert_eq!(first.payee, "Corner Store");
        assert_eq!(first.amount.cents(), -1250);
        assert_eq!(first.memo, "snacks");
    }

    #[test]
    fn test_import_skips_duplicates() {
        let (_temp_dir, storage, account_id) = create_test_storage();
        let service = ImportService::new(&storage);

        let parsed = service
            .parse_csv(CSV.as_bytes(), &ColumnMapping::default())
            .unwrap();

        let first = service.import(account_id, &parsed.transactions).unwrap();
        assert_eq!(first.added, 3);
        assert_eq!(first.skipped_duplicates, 0);

        // Importing the same file again adds nothing
        let second = service.import(account_id, &parsed.transactions).unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.skipped_duplicates, 3);
    }

    #[test]
    fn test_custom_date_format() {
        let (_temp_dir, storage, _account_id) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv = "01/15/2025,Store,-1.00\n";
        let mapping = ColumnMapping {
            memo: None,
            date_format: "%m/%d/%Y".to_string(),
            has_header: false,
            ..ColumnMapping::default()
        };

        let result = service.parse_csv(csv.as_bytes(), &mapping).unwrap();
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(
            result.transactions[0].date,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }
}
