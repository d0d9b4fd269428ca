//! Transaction export
//!
//! Renders the live transaction register (with account, payee and
//! category names resolved) as CSV, JSON or YAML.

mod rows;

pub use rows::{transactions_csv, transactions_json, transactions_yaml, ExportRow};
