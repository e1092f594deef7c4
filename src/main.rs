use clap::Parser;
use inventory_ledger::api::{self, Inventory};
use inventory_ledger::args::{Args, Command};
use inventory_ledger::model::HistoryStore;
use inventory_ledger::{commands, Config, Mode, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().inventory_home().path();

    // When INVENTORY_LEDGER_IN_TEST_MODE is set and non-empty the mode is Mode::Test and a seeded,
    // in-memory ledger is used, otherwise it is Mode::Rpc.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.ledger_url(), init_args.signer())
                .await?
                .print()
        }

        Command::Import(import_args) => {
            let (config, inventory) = load(home, mode).await?;
            commands::import(&config, &inventory, import_args)
                .await?
                .print()
        }

        Command::Add(add_args) => {
            let (_, inventory) = load(home, mode).await?;
            commands::add(&inventory, add_args).await?.print()
        }

        Command::Update(update_args) => {
            let (_, inventory) = load(home, mode).await?;
            commands::update(&inventory, update_args).await?.print()
        }

        Command::Delete(id_args) => {
            let (_, inventory) = load(home, mode).await?;
            commands::delete(&inventory, id_args.id()).await?.print()
        }

        Command::Product(id_args) => {
            let (_, inventory) = load(home, mode).await?;
            commands::product(&inventory, id_args.id()).await?.print()
        }

        Command::Products => {
            let (_, inventory) = load(home, mode).await?;
            commands::products(&inventory).await?.print()
        }

        Command::History => {
            let (config, inventory) = load(home, mode).await?;
            commands::history(&config, &inventory, &HistoryStore::new())
                .await?
                .print()
        }

        Command::Stats => {
            let (config, inventory) = load(home, mode).await?;
            commands::stats(&config, &inventory, &HistoryStore::new())
                .await?
                .print()
        }

        Command::Export(export_args) => {
            let (config, inventory) = load(home, mode).await?;
            commands::export(&config, &inventory, &HistoryStore::new(), export_args)
                .await?
                .print()
        }
    };
    Ok(())
}

/// Loads the config and connects to the ledger selected by `mode`.
async fn load(home: &Path, mode: Mode) -> Result<(Config, Inventory)> {
    let config = Config::load(home).await?;
    let ledger = api::ledger(&config, mode)?;
    let inventory = Inventory::new(ledger, config.signer());
    Ok((config, inventory))
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={level},inventory_ledger={level}",
                env!("CARGO_BIN_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
