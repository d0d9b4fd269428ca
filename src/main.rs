use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::api::{ApiContext, HandlerRegistry};
use tally::cli::{
    handle_auth_command, handle_link_command, handle_tools_command, handle_transaction_command,
    handle_user_command, AuthCommands, LinkCommands, ToolsCommands, TransactionCommands,
    UserCommands,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::services::banklink::UnconfiguredProvider;
use tally::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Local-first budgeting with a JSON-RPC handler surface",
    long_about = "Tally keeps a personal budget in local JSON storage and exposes \
                  the operations front-ends need as string-keyed handlers. It also \
                  ships user-directory management, bank linking, and repair tooling \
                  for split transactions."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// User directory management
    #[command(subcommand)]
    User(UserCommands),

    /// Transaction management
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Maintenance tools
    #[command(subcommand)]
    Tools(ToolsCommands),

    /// Authentication
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Bank linking
    #[command(subcommand)]
    Link(LinkCommands),

    /// Call a handler method directly with a JSON payload
    Api {
        /// Method name (see `tally api --list`)
        #[arg(required_unless_present = "list")]
        method: Option<String>,
        /// JSON payload (defaults to {})
        payload: Option<String>,
        /// List available methods
        #[arg(long)]
        list: bool,
    },

    /// Initialize a new budget
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = TallyPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::User(cmd)) => {
            handle_user_command(&storage, cmd)?;
        }
        Some(Commands::Transaction(cmd)) => {
            handle_transaction_command(&storage, cmd)?;
        }
        Some(Commands::Tools(cmd)) => {
            handle_tools_command(&storage, cmd)?;
        }
        Some(Commands::Auth(cmd)) => {
            handle_auth_command(&storage, cmd)?;
        }
        Some(Commands::Link(cmd)) => {
            handle_link_command(&storage, &UnconfiguredProvider, cmd)?;
        }
        Some(Commands::Api {
            method,
            payload,
            list,
        }) => {
            let registry = HandlerRegistry::new();
            if list {
                for name in registry.methods() {
                    println!("{}", name);
                }
                return Ok(());
            }

            let method = method.ok_or_else(|| anyhow::anyhow!("a method name is required"))?;
            let payload = match payload {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::json!({}),
            };

            let mut ctx = ApiContext {
                storage: &storage,
                settings: &mut settings,
                provider: &UnconfiguredProvider,
            };
            let response = registry.dispatch(&mut ctx, &method, payload);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some(Commands::Init) => {
            println!("Initializing Tally at: {}", paths.data_dir().display());
            tally::storage::init::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Default category groups and categories have been created.");
            println!("Run 'tally api get-categories' to see them.");
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!();
            println!("Settings:");
            println!("  Budget name:        {}", settings.budget_name);
            println!("  Encryption enabled: {}", settings.encryption.enabled);
        }
        None => {
            println!("Tally - local-first budgeting");
            println!();
            println!("Run 'tally --help' for usage information.");
            println!("Run 'tally init' to set up a new budget.");
        }
    }

    Ok(())
}
