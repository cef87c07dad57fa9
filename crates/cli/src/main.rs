//! StockMate CLI - Database migrations and shop account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! stockmate migrate
//!
//! # Create a shop (password on stdin)
//! stockmate shop create -e owner@example.com -n "Corner Shop" -p 555-0100 -a "1 High St"
//!
//! # Mark a shop verified
//! stockmate shop verify -e owner@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockmate")]
#[command(author, version, about = "StockMate operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shop accounts
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
}

#[derive(Subcommand)]
enum ShopAction {
    /// Create a shop account (password is read from stdin)
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Shop display name
        #[arg(short, long)]
        name: String,

        /// Contact phone number
        #[arg(short, long)]
        phone: String,

        /// Postal address
        #[arg(short, long)]
        address: String,

        /// Mark the account verified immediately
        #[arg(long)]
        verified: bool,
    },
    /// Mark a shop account verified
    Verify {
        /// Login email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Shop { action } => match action {
            ShopAction::Create {
                email,
                name,
                phone,
                address,
                verified,
            } => {
                commands::shop::create(commands::shop::NewShopArgs {
                    name,
                    email,
                    phone,
                    address,
                    verified,
                })
                .await?;
            }
            ShopAction::Verify { email } => commands::shop::verify(&email).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
