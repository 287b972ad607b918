//! SellApp CLI - Operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Check a swap before recording it
//! sellapp-cli swap-balance --price 500 --customer-value 450 --topup 50
//!
//! # Report customers sharing a phone number
//! sellapp-cli duplicates customers.json
//!
//! # Check the POS API answers with the configured token
//! sellapp-cli ping
//! ```
//!
//! # Commands
//!
//! - `swap-balance` - Compute and classify a swap balance
//! - `duplicates` - Group customers by normalized phone number
//! - `ping` - Call the API's products endpoint

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sellapp-cli")]
#[command(author, version, about = "SellApp operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the balance of a device swap
    SwapBalance {
        /// Store product price
        #[arg(short, long)]
        price: String,

        /// Value given for the customer's device
        #[arg(short, long)]
        customer_value: String,

        /// Cash top-up from the customer
        #[arg(short, long, default_value = "0")]
        topup: String,
    },
    /// Report customers that share a phone number
    Duplicates {
        /// JSON file holding a customer array or an API response envelope
        file: std::path::PathBuf,
    },
    /// Check that the POS API is reachable
    Ping,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::SwapBalance {
            price,
            customer_value,
            topup,
        } => commands::swap::balance(&price, &customer_value, &topup),
        Commands::Duplicates { file } => commands::duplicates::report(&file)?,
        Commands::Ping => commands::ping::run().await?,
    }
    Ok(())
}
