//! vaultlink - connect third-party accounts when an agent asks for them
//!
//! Reads an agent interrupt, shows the consent prompt, and drives the popup or
//! redirect authorization flow through the system browser.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vaultlink_core::ConsentConfig;

mod browser;
mod commands;
mod return_listener;

#[derive(Parser)]
#[command(name = "vaultlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to <config dir>/vaultlink/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Web app origin, overriding the config file
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route an interrupt and run its consent flow
    #[command(after_help = commands::handle::AFTER_HELP)]
    Handle(commands::handle::HandleArgs),

    /// Print the connect URL for a connection and scopes
    Url(commands::connect::UrlArgs),

    /// Check whether the web app has a logged-in session
    Whoami,

    /// Print login, signup, logout and connect links
    Links,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vaultlink=debug,vaultlink_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ConsentConfig::load(cli.config.as_deref())?;
    let origin = commands::resolve_origin(&config, cli.origin.as_deref())?;
    tracing::debug!(origin = %origin, mode = %config.mode, "Configuration loaded");

    match cli.command {
        Commands::Handle(args) => commands::handle::execute(args, &config, origin).await,
        Commands::Url(args) => commands::connect::execute(args, &config, &origin),
        Commands::Whoami => commands::whoami::execute(origin).await,
        Commands::Links => commands::links::execute(&origin, &config.page_path),
    }
}
