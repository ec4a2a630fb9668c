mod prompt;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stocktake_api::{Credential, CredentialStore, InventoryClient};
use stocktake_engine::{
    folder_filters, run_sync, DiffRecord, FolderIndex, RunOutcome, SnapshotStore,
};

#[derive(Debug, Parser)]
#[command(name = "stocktake")]
#[command(about = "Inventory catalog sync and change detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the catalog, classify changes since the last run, and update
    /// the snapshot.
    Run {
        /// Restrict the run to one folder and everything below it.
        #[arg(long)]
        folder: Option<String>,
        /// Emit classified records as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the folder tree.
    Folders,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = stocktake_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let credentials = Arc::new(CredentialStore::new(
        Credential {
            login: config.api_login.clone(),
            secret: config.api_password.clone(),
        },
        Box::new(prompt::StdinCredentials),
        config.max_login_attempts,
    ));
    let client = InventoryClient::new(&config, credentials)?;

    match Cli::parse().command {
        Commands::Run { folder, json } => {
            let filters = match folder {
                Some(name) => folder_filters(&client, &name).await?,
                None => Vec::new(),
            };
            let snapshot = SnapshotStore::new(&config.snapshot_path);
            let outcome = run_sync(&client, &config, &snapshot, &filters).await?;
            report(&outcome, json)?;
        }
        Commands::Folders => {
            let index = FolderIndex::build(client.fetch_folders().await?);
            for (path, _) in index.entries() {
                println!("{path}");
            }
        }
    }

    Ok(())
}

fn report(outcome: &RunOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        for entry in &outcome.entries {
            println!("{}", serde_json::to_string(entry)?);
        }
        println!("{}", serde_json::to_string(&outcome.summary)?);
        return Ok(());
    }

    for entry in &outcome.entries {
        match &entry.record {
            DiffRecord::Current(product) => println!(
                "{:<13} {:<16} stock={:<8} {}",
                entry.change, product.code, product.stock, product.name
            ),
            DiffRecord::Departed { code, last_stock } => println!(
                "{:<13} {:<16} last_stock={}",
                entry.change, code, last_stock
            ),
        }
    }

    let summary = &outcome.summary;
    println!(
        "{}: {} listed, {} fetched, {} failed — {} new, {} stock changed, {} disappeared, {} unchanged{}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        summary.listed,
        summary.fetched,
        summary.failed_items,
        summary.new,
        summary.stock_changed,
        summary.disappeared,
        summary.unchanged,
        if summary.snapshot_saved {
            ""
        } else {
            " (snapshot left untouched)"
        }
    );
    Ok(())
}
