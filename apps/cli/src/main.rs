//! Bizdesk CLI - manage clients, tasks, finances and advice from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use bizdesk_config::{init_logging, Config, Paths};
use commands::{AppContext, ClientFields, Redirect, TaskFields};
use tracing::debug;

/// Bizdesk CLI - run your small business from the terminal.
#[derive(Parser)]
#[command(name = "bizdesk")]
#[command(about = "Bizdesk CLI for clients, tasks, finances and business advice")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Email address (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// Log in again even if a session exists
        #[arg(long)]
        force: bool,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status {
        /// Confirm the stored session with the server
        #[arg(long)]
        verify: bool,
    },

    /// Overview of clients, tasks and balance
    Dashboard,

    /// Manage clients
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show the finance summary
    Finance,

    /// Ask the AI business advisor
    Advice {
        /// Question to ask
        message: Option<String>,
        /// Keep asking in an interactive conversation
        #[arg(long)]
        chat: bool,
    },

    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// List clients
    List,
    /// Show client details
    Show {
        /// Client ID
        id: String,
    },
    /// Add a client
    Add {
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Update a client
    Update {
        /// Client ID
        id: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Remove a client
    Remove {
        /// Client ID
        id: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks that are not done
        #[arg(long)]
        open: bool,
    },
    /// Add a task
    Add {
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update your profile
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New email
        #[arg(long)]
        email: Option<String>,
        /// Preference as key=value; key= removes it (repeatable)
        #[arg(long = "pref")]
        preferences: Vec<String>,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level).to_string();
    init_logging("cli", &level, &paths, false);
    debug!(api_url = %config.api_url, "Starting bizdesk CLI");

    let ctx = AppContext::load(&paths, config, cli.format).await?;

    match cli.command {
        Commands::Login { email, force } => commands::login(&ctx, email, force).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status { verify } => commands::status(&ctx, verify).await,
        Commands::Dashboard => commands::dashboard(&ctx).await,
        Commands::Clients { command } => match command {
            ClientCommands::List => commands::clients_list(&ctx).await,
            ClientCommands::Show { id } => commands::clients_show(&ctx, &id).await,
            ClientCommands::Add { fields } => commands::clients_add(&ctx, fields).await,
            ClientCommands::Update { id, fields } => {
                commands::clients_update(&ctx, &id, fields).await
            }
            ClientCommands::Remove { id } => commands::clients_remove(&ctx, &id).await,
        },
        Commands::Tasks { command } => match command {
            TaskCommands::List { open } => commands::tasks_list(&ctx, open).await,
            TaskCommands::Add { fields } => commands::tasks_add(&ctx, fields).await,
            TaskCommands::Update { id, fields } => commands::tasks_update(&ctx, &id, fields).await,
            TaskCommands::Remove { id } => commands::tasks_remove(&ctx, &id).await,
        },
        Commands::Finance => commands::finance(&ctx).await,
        Commands::Advice { message, chat } => commands::advice(&ctx, message, chat).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile_show(&ctx).await,
            ProfileCommands::Update {
                name,
                email,
                preferences,
            } => commands::profile_update(&ctx, name, email, preferences).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<Redirect>() {
            Some(redirect) => redirect.print(&format),
            None => output::print_error(&format!("{:#}", e), &format),
        }
        std::process::exit(1);
    }
}
