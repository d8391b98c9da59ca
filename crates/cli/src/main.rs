//! Tillpoint CLI - Reference data lookups and scripted checkouts.
//!
//! # Usage
//!
//! ```bash
//! # List countries and the states of one of them
//! tp-cli countries
//! tp-cli states --country CA
//!
//! # Card expiration choices
//! tp-cli card-years
//! tp-cli card-months --year 2027
//!
//! # Run a whole checkout from a JSON script
//! tp-cli checkout --input crates/cli/fixtures/checkout.json
//! ```
//!
//! # Environment Variables
//!
//! See `tillpoint_checkout::config`. Without `CHECKOUT_API_BASE_URL` every
//! command runs against the built-in catalogue and an in-memory order gateway.
//! `LOG_FORMAT=json` switches log output to JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(author, version, about = "Tillpoint checkout CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List countries
    Countries,
    /// List the states of a country
    States {
        /// Country code (e.g., CA)
        #[arg(short, long)]
        country: String,
    },
    /// List card expiration months
    CardMonths {
        /// Expiration year; defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List card expiration years
    CardYears,
    /// Run a checkout described by a JSON script
    Checkout {
        /// Path to the checkout script
        #[arg(short, long)]
        input: String,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tillpoint_checkout=info,tp_cli=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Countries => commands::reference::countries().await,
        Commands::States { country } => commands::reference::states(&country).await,
        Commands::CardMonths { year } => commands::reference::card_months(year).await,
        Commands::CardYears => commands::reference::card_years().await,
        Commands::Checkout { input } => commands::checkout::run(&input).await,
    }
}
