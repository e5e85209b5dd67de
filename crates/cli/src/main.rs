//! Keepsake CLI - keep command

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod util;

/// Keepsake - personal-memory timeline journal
#[derive(Parser)]
#[command(name = "keep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the journal store and default configuration
    Init,
    /// Create a new memory or chapter
    New {
        /// Entity kind: memory or chapter
        #[arg(value_parser = ["memory", "chapter"])]
        kind: String,
        /// Initial fields as field=value pairs
        #[arg(short, long = "set")]
        set: Vec<String>,
    },
    /// List all entities in the journal
    List {
        /// Number of entities to show (default: all)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one entity in detail
    Show {
        /// Entity ID
        id: String,
    },
    /// Edit an entity through a synchronized session
    Edit {
        /// Entity ID
        id: String,
        /// Field edits as field=value pairs
        #[arg(short, long = "set")]
        set: Vec<String>,
        /// Attach a file to a field, as field=path
        #[arg(long)]
        attach: Vec<String>,
        /// Remove the attachment in a field
        #[arg(long)]
        remove_attachment: Vec<String>,
        /// Force a manual save before closing
        #[arg(long)]
        save: bool,
    },
    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a single value
    Get { key: String },
    /// Set a value
    Set { key: String, value: String },
    /// Show the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd::init::run().await,
        Commands::New { kind, set } => cmd::new::run(&kind, &set).await,
        Commands::List { limit } => cmd::list::run(limit).await,
        Commands::Show { id } => cmd::show::run(&id).await,
        Commands::Edit {
            id,
            set,
            attach,
            remove_attachment,
            save,
        } => cmd::edit::run(&id, &set, &attach, &remove_attachment, save).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path => cmd::config::run_path().await,
        },
    }
}
