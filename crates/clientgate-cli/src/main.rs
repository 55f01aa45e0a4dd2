//! clientgate CLI - client administration and credential checks.

mod commands;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "clientgate")]
#[command(about = "clientgate - login and bearer token authentication")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.clientgate/clientgate.json)
    #[arg(long, global = true, env = "CLIENTGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with a freshly generated JWT secret
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Client management
    Client {
        #[command(subcommand)]
        action: ClientCommands,
    },

    /// Check an email/password pair against the store
    Verify {
        /// Client email
        email: String,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Resolve a bearer token to its client
    Resolve {
        /// Bearer token
        token: String,
    },

    /// Mint an access token for a client
    Token {
        /// Client ID
        client_id: String,

        /// Print the token as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Register a new client
    Add {
        /// Client email
        email: String,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// List all clients
    List,

    /// Delete a client
    Remove {
        /// Client ID
        id: String,

        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(clientgate_core::Config::default_path);

    match cli.command {
        Commands::Init { force } => {
            commands::run_init(&config_path, force)?;
        }

        Commands::Client { action } => {
            let action = match action {
                ClientCommands::Add { email, password } => {
                    commands::client::ClientAction::Add { email, password }
                }
                ClientCommands::List => commands::client::ClientAction::List,
                ClientCommands::Remove { id, yes } => {
                    commands::client::ClientAction::Remove { id, yes }
                }
            };
            commands::run_client(&config_path, action).await?;
        }

        Commands::Verify { email, password } => {
            commands::run_verify(&config_path, &email, password).await?;
        }

        Commands::Resolve { token } => {
            commands::run_resolve(&config_path, &token).await?;
        }

        Commands::Token { client_id, json } => {
            commands::run_token(&config_path, &client_id, json).await?;
        }
    }

    Ok(())
}
