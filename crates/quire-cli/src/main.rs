//! Quire CLI
//!
//! Command-line interface for Quire - pages of a block editor workspace.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quire_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Quire - pages of a block editor workspace")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all pages
    #[command(alias = "ls")]
    Pages,
    /// Show a page and its blocks
    Show {
        /// Page ID
        id: String,
    },
    /// Create a new page
    #[command(alias = "add")]
    Create {
        /// Page title (defaults to the configured default title)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// JSON file holding the initial blocks
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Rename a page
    Rename {
        /// Page ID
        id: String,
        /// New title
        title: String,
    },
    /// Delete a page
    #[command(alias = "rm")]
    Delete {
        /// Page ID
        id: String,
    },
    /// Edit a page's blocks in $EDITOR
    Edit {
        /// Page ID
        id: String,
    },
    /// Show server health and statistics
    Status,
    /// Show the server operation log
    Logs {
        /// Only show the most recent entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, save_debounce_ms, request_timeout_secs, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without a reachable server
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Pages => commands::page::list(&config, &output).await,
        Commands::Show { id } => commands::page::show(&config, id, &output).await,
        Commands::Create { title, file } => {
            commands::page::create(&config, title, file, &output).await
        }
        Commands::Rename { id, title } => {
            commands::page::rename(&config, id, title, &output).await
        }
        Commands::Delete { id } => commands::page::delete(&config, id, &output).await,
        Commands::Edit { id } => commands::page::edit(&config, id, &output).await,
        Commands::Status => commands::status::show(&config, &output).await,
        Commands::Logs { limit } => commands::logs::show(&config, limit, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging when QUIRE_LOG is set
///
/// Logs go to the configured log file, or stderr if it cannot be created.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("QUIRE_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("quire_core={},quire_cli={}", log_level, log_level));
    let log_path = config.log_path();

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match File::create(&log_path) {
        Ok(log_file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
