//! review-anchor CLI
//!
//! Drives [`AnchorContext`] from a terminal. The wallet session and the
//! network choice live in the state file between invocations, so
//! `connect` followed by `anchor` behaves like one long-lived session.
//!
//! ```text
//! review-anchor connect
//! review-anchor anchor --kind review --file opinion.txt
//! review-anchor lookup 0x5f1c…
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use review_anchor::config::load_or_default;
use review_anchor::observability::init_logging;
use review_anchor::{AnchorContext, NetworkId, RecordKind};

#[derive(Parser)]
#[command(name = "review-anchor")]
#[command(about = "Anchor review and CLE records on Aptos or Stellar", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "review-anchor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session and client state
    Status,
    /// Connect the wallet for the active network
    Connect,
    /// Disconnect the active wallet
    Disconnect,
    /// Make another network active (aptos/primary, stellar/secondary)
    Switch { network: NetworkId },
    /// Anchor a record and print its reference id
    Anchor {
        #[arg(short, long, default_value = "review")]
        kind: RecordKind,
        /// Read content from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Use the given text as content
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Check whether a reference id is well-formed
    Verify { id: String },
    /// Fetch the on-chain status of a reference
    Lookup { id: String },
    /// Show the readiness of each network client
    Clients,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_default(&cli.config)?;
    init_logging(&config.observability);

    tracing::debug!(
        config = %cli.config.display(),
        network = %config.session.default_network,
        fallback = ?config.anchoring.fallback,
        "Configuration loaded"
    );

    let context = AnchorContext::from_config(&config);
    context.start();

    match cli.command {
        Commands::Status => print_json(&context.snapshot())?,
        Commands::Connect => {
            let address = context.connect_wallet().await?;
            print_json(&json!({
                "network": context.network(),
                "address": address,
                "wallet": context.wallet_name(),
            }))?;
        }
        Commands::Disconnect => {
            context.disconnect_wallet().await;
            print_json(&context.snapshot())?;
        }
        Commands::Switch { network } => {
            context.switch_network(network).await;
            print_json(&context.snapshot())?;
        }
        Commands::Anchor { kind, file, text } => {
            let content = match (file, text) {
                (Some(path), _) => std::fs::read(path)?,
                (None, Some(text)) => text.into_bytes(),
                (None, None) => return Err("either --file or --text is required".into()),
            };
            let id = context.create_record(&content, kind).await?;
            print_json(&json!({
                "id": id,
                "reference": context.snapshot().latest_transaction,
            }))?;
        }
        Commands::Verify { id } => {
            print_json(&json!({ "id": id, "valid": context.verify_record(&id) }))?;
        }
        Commands::Lookup { id } => {
            let reference = context.get_verification_status(&id).await?;
            print_json(&reference)?;
        }
        Commands::Clients => print_json(&context.client_status())?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
