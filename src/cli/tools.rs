//! Maintenance tool CLI commands

use clap::Subcommand;

use crate::display::render_repair_report;
use crate::error::TallyResult;
use crate::services::RepairService;
use crate::storage::Storage;

/// Tools subcommands
#[derive(Subcommand)]
pub enum ToolsCommands {
    /// Repair split transactions: fill blank child payees, re-sync
    /// cleared flags, tombstone orphaned children, clear stray transfer
    /// categories, and report split-amount mismatches
    FixSplits,
}

/// Handle a tools command
pub fn handle_tools_command(storage: &Storage, cmd: ToolsCommands) -> TallyResult<()> {
    match cmd {
        ToolsCommands::FixSplits => {
            let report = RepairService::new(storage).fix_split_transactions()?;
            if report.is_clean() {
                println!("No problems found.");
                return Ok(());
            }
            println!("{}", render_repair_report(&report));
        }
    }

    Ok(())
}
