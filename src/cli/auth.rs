//! Authentication CLI commands

use clap::Subcommand;

use crate::error::TallyResult;
use crate::services::AuthService;
use crate::storage::Storage;

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Set the password and create the owner user
    Bootstrap,
    /// Sign in and print a session token
    Login,
    /// Change the password (invalidates other sessions)
    ChangePassword {
        /// Session token from `tally auth login`
        #[arg(short, long, env = "TALLY_TOKEN")]
        token: String,
    },
    /// Drop a session
    Logout {
        /// Session token to drop
        #[arg(short, long, env = "TALLY_TOKEN")]
        token: String,
    },
    /// Show who a token belongs to
    Whoami {
        /// Session token to inspect
        #[arg(short, long, env = "TALLY_TOKEN")]
        token: String,
    },
}

fn prompt_password(prompt: &str) -> TallyResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|e| crate::error::TallyError::Io(format!("Failed to read password: {}", e)))
}

/// Handle an auth command
pub fn handle_auth_command(storage: &Storage, cmd: AuthCommands) -> TallyResult<()> {
    let service = AuthService::new(storage);

    match cmd {
        AuthCommands::Bootstrap => {
            let password = prompt_password("New password: ")?;
            let confirm = prompt_password("Confirm password: ")?;
            if password != confirm {
                return Err(crate::error::TallyError::Auth(
                    "Passwords do not match".to_string(),
                ));
            }
            let owner = service.bootstrap(&password)?;
            println!("Bootstrapped. Owner user: {}", owner.user_name);
        }
        AuthCommands::Login => {
            let password = prompt_password("Password: ")?;
            let session = service.sign_in(&password)?;
            println!("{}", session.token);
            eprintln!("Token expires {}", session.expires_at.format("%Y-%m-%d"));
        }
        AuthCommands::ChangePassword { token } => {
            let password = prompt_password("New password: ")?;
            service.change_password(&token, &password)?;
            println!("Password changed. Other sessions were signed out.");
        }
        AuthCommands::Logout { token } => {
            service.sign_out(&token)?;
            println!("Signed out.");
        }
        AuthCommands::Whoami { token } => {
            let user = service.verify(&token)?;
            println!("{} ({})", user.shown_name(), user.role);
        }
    }

    Ok(())
}
