//! User directory CLI commands

use clap::Subcommand;

use crate::display::render_user_table;
use crate::error::TallyResult;
use crate::models::UserId;
use crate::services::user::{UserInput, UserService};
use crate::storage::Storage;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    List {
        /// Filter by name or role (case-insensitive substring)
        #[arg(short, long, default_value = "")]
        filter: String,
        /// Listing page (each page extends the window)
        #[arg(short, long, default_value = "0")]
        page: usize,
    },
    /// Add a new user
    Add {
        /// Login name
        user_name: String,
        /// Display name
        #[arg(short, long, default_value = "")]
        display_name: String,
        /// Role: admin or basic
        #[arg(short, long)]
        role: String,
        /// Create the user disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Update an existing user
    Update {
        /// User id
        id: UserId,
        /// New login name
        user_name: String,
        /// New display name
        #[arg(short, long, default_value = "")]
        display_name: String,
        /// Role: admin or basic
        #[arg(short, long)]
        role: String,
        /// Disable the user
        #[arg(long)]
        disabled: bool,
    },
    /// Delete users by id
    Delete {
        /// User ids
        ids: Vec<UserId>,
    },
}

/// Handle a user command
pub fn handle_user_command(storage: &Storage, cmd: UserCommands) -> TallyResult<()> {
    let service = UserService::new(storage);

    match cmd {
        UserCommands::List { filter, page } => {
            let users = service.list_window(&filter, page)?;
            if users.is_empty() {
                println!("No users");
                return Ok(());
            }
            println!("{}", render_user_table(&users));
        }
        UserCommands::Add {
            user_name,
            display_name,
            role,
            disabled,
        } => {
            let user = service.create(UserInput {
                user_name,
                display_name,
                role: Some(role),
                enabled: !disabled,
            })?;
            println!("Created user {} ({})", user.user_name, user.id);
            if user.owner {
                println!("This user is the owner.");
            }
        }
        UserCommands::Update {
            id,
            user_name,
            display_name,
            role,
            disabled,
        } => {
            let user = service.update(
                id,
                UserInput {
                    user_name,
                    display_name,
                    role: Some(role),
                    enabled: !disabled,
                },
            )?;
            println!("Updated user {}", user.user_name);
        }
        UserCommands::Delete { ids } => {
            let result = service.delete_all(&ids)?;
            println!("Deleted {} users", result.deleted);
            if result.some_deletions_failed {
                println!(
                    "Not all users were deleted. Check if one of the selected users is the owner."
                );
            }
        }
    }

    Ok(())
}
