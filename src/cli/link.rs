//! Bank-link CLI commands
//!
//! Drives the two-step authorization flow: print the link, wait for the
//! external authorization, then link the discovered accounts.

use clap::Subcommand;

use crate::error::TallyResult;
use crate::models::AccountId;
use crate::services::banklink::{BankLinkProvider, BankLinkService};
use crate::storage::Storage;

/// Bank-link subcommands
#[derive(Subcommand)]
pub enum LinkCommands {
    /// Authorize against a bank and link the discovered accounts
    Start {
        /// Institution id at the provider
        institution: String,
        /// Days the access should stay valid
        #[arg(long, default_value = "90")]
        access_days: u32,
    },
    /// Remove the bank link from an account
    Unlink {
        /// Account id
        account: AccountId,
    },
}

/// Handle a bank-link command
pub fn handle_link_command(
    storage: &Storage,
    provider: &dyn BankLinkProvider,
    cmd: LinkCommands,
) -> TallyResult<()> {
    let service = BankLinkService::new(storage, provider);

    match cmd {
        LinkCommands::Start {
            institution,
            access_days,
        } => {
            let token = service.create_web_token(&institution, access_days)?;
            println!("Open this link in your browser to authorize:");
            println!("  {}", token.link);
            println!("Waiting for authorization...");

            let accounts = service.poll_web_token(&token.requisition_id)?;
            println!("Authorized. Found {} accounts:", accounts.len());

            for external in &accounts {
                let account = service.link_account(external, &token.requisition_id, None)?;
                println!("  linked '{}' as {}", external.name, account.id);
            }
        }
        LinkCommands::Unlink { account } => {
            let account = service.unlink_account(account)?;
            println!("Unlinked '{}'", account.name);
        }
    }

    Ok(())
}
