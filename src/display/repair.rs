//! Repair report rendering

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::services::repair::RepairReport;

#[derive(Tabled)]
struct RepairRow {
    #[tabled(rename = "Repair")]
    repair: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

/// Render the repair report as a table plus any split mismatches
pub fn render_repair_report(report: &RepairReport) -> String {
    let rows = vec![
        RepairRow {
            repair: "Blank child payees filled from parent",
            rows: report.num_blank_payees,
        },
        RepairRow {
            repair: "Cleared flags re-synced with parent",
            rows: report.num_cleared,
        },
        RepairRow {
            repair: "Orphaned children tombstoned",
            rows: report.num_deleted,
        },
        RepairRow {
            repair: "Transfer categories cleared",
            rows: report.num_transfers_fixed,
        },
    ];

    let mut output = Table::new(rows).with(Style::sharp()).to_string();

    if !report.mismatched_splits.is_empty() {
        output.push_str("\n\nSplit transactions whose amounts do not add up:\n");
        for mismatch in &report.mismatched_splits {
            output.push_str(&format!(
                "  {}: amount {} but splits total {}\n",
                mismatch.transaction_id, mismatch.transaction_amount, mismatch.splits_total
            ));
        }
        output.push_str("These need to be fixed by hand.");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionId};
    use crate::services::repair::SplitMismatch;

    #[test]
    fn test_clean_report_renders_counts_only() {
        let report = RepairReport::default();
        let output = render_repair_report(&report);
        assert!(output.contains("Blank child payees"));
        assert!(!output.contains("by hand"));
    }

    #[test]
    fn test_mismatches_listed() {
        let report = RepairReport {
            mismatched_splits: vec![SplitMismatch {
                transaction_id: TransactionId::new(),
                transaction_amount: Money::from_cents(-12000),
                splits_total: Money::from_cents(-10000),
            }],
            ..Default::default()
        };

        let output = render_repair_report(&report);
        assert!(output.contains("-$120.00"));
        assert!(output.contains("-$100.00"));
        assert!(output.contains("by hand"));
    }
}
