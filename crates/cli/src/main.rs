//! Saakie CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! saakie-cli migrate
//!
//! # Promote the first administrator (webhook-created accounts are CUSTOMER)
//! saakie-cli users set-role --email owner@saakie.in --role ADMIN
//!
//! # Development only: sign in as an identity without the provider
//! saakie-cli session issue --external-id user_2abc --days 1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `users set-role` - Change a directory account's role
//! - `session issue` - Write a session holding an identity and print its cookie

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "saakie-cli")]
#[command(author, version, about = "Saakie CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage directory accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Manage sessions (development)
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Set the role of the account with the given email
    SetRole {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New role (`CUSTOMER`, `MANAGER`, `ADMIN`)
        #[arg(short, long)]
        role: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Issue a session for an external identity and print the cookie
    Issue {
        /// Identity provider user id (e.g. `user_2abc...`)
        #[arg(long)]
        external_id: String,

        /// Session lifetime in days
        #[arg(long, default_value_t = 1)]
        days: u16,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Users { action } => match action {
            UsersAction::SetRole { email, role } => {
                commands::users::set_role(&email, &role).await?;
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Issue { external_id, days } => {
                let cookie = commands::session::issue(&external_id, days).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{cookie}");
                }
            }
        },
    }
    Ok(())
}
