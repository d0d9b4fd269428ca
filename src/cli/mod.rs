//! CLI command handlers
//!
//! One module per command family, each exposing its clap subcommand enum
//! and a `handle_*_command` function.

pub mod auth;
pub mod link;
pub mod tools;
pub mod transaction;
pub mod user;

pub use auth::{handle_auth_command, AuthCommands};
pub use link::{handle_link_command, LinkCommands};
pub use tools::{handle_tools_command, ToolsCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use user::{handle_user_command, UserCommands};
