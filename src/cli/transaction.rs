//! Transaction CLI commands

use clap::Subcommand;
use chrono::{NaiveDate, Utc};

use crate::error::{TallyError, TallyResult};
use crate::export;
use crate::models::Money;
use crate::services::import::ColumnMapping;
use crate::services::transaction::{CreateTransactionInput, TransactionFilter};
use crate::services::{ImportService, TransactionService};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Account name
        account: String,
        /// Amount, e.g. "-12.50"
        amount: String,
        /// Payee name
        #[arg(short, long)]
        payee: Option<String>,
        /// Category name
        #[arg(short, long)]
        category: Option<String>,
        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Memo
        #[arg(short, long)]
        memo: Option<String>,
    },
    /// List transactions
    List {
        /// Filter by account name
        #[arg(short, long)]
        account: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Import transactions from CSV
    Import {
        /// Path to CSV file
        file: String,
        /// Target account name
        #[arg(short, long)]
        account: String,
    },
    /// Export transactions
    Export {
        /// Output format: csv, json or yaml
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

fn resolve_account(storage: &Storage, name: &str) -> TallyResult<crate::models::Account> {
    storage
        .accounts
        .get_by_name(name)?
        .ok_or_else(|| TallyError::account_not_found(name))
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> TallyResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            account,
            amount,
            payee,
            category,
            date,
            memo,
        } => {
            let account = resolve_account(storage, &account)?;
            let amount = Money::parse(&amount)
                .map_err(|e| TallyError::Validation(e.to_string()))?;
            let category_id = match category {
                Some(name) => Some(
                    storage
                        .categories
                        .get_category_by_name(&name)?
                        .ok_or_else(|| TallyError::category_not_found(name))?
                        .id,
                ),
                None => None,
            };

            let txn = service.create(CreateTransactionInput {
                account_id: account.id,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                amount,
                payee_name: payee,
                category_id,
                memo,
                status: None,
            })?;
            println!("Added {} to '{}' ({})", txn.amount, account.name, txn.id);
        }
        TransactionCommands::List { account, limit } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(name) = account {
                filter = filter.account(resolve_account(storage, &name)?.id);
            }

            let transactions = service.list(filter)?;
            if transactions.is_empty() {
                println!("No transactions");
                return Ok(());
            }
            for txn in transactions {
                println!("{}  {}  {}", txn.date, txn.amount, txn.memo);
            }
        }
        TransactionCommands::Import { file, account } => {
            let account = resolve_account(storage, &account)?;
            let import = ImportService::new(storage);

            let parsed =
                import.parse_csv_file(std::path::Path::new(&file), &ColumnMapping::default())?;
            for error in &parsed.errors {
                eprintln!("warning: {}", error);
            }

            let result = import.import(account.id, &parsed.transactions)?;
            println!(
                "Imported {} transactions ({} duplicates skipped)",
                result.added, result.skipped_duplicates
            );
        }
        TransactionCommands::Export { format } => {
            let output = match format.as_str() {
                "csv" => export::transactions_csv(storage)?,
                "json" => export::transactions_json(storage)?,
                "yaml" => export::transactions_yaml(storage)?,
                other => {
                    return Err(TallyError::Export(format!("Unknown format: {}", other)));
                }
            };
            print!("{}", output);
        }
    }

    Ok(())
}
