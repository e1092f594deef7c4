//! These structs provide the CLI interface for the inventory CLI.

use crate::export::Dataset;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// inventory: A command-line tool for keeping a product inventory on a ledger.
///
/// Products are written to an inventory contract on an append-only ledger through a JSON-RPC
/// gateway. You can bulk import products from a comma or tab separated file, review the audit
/// trail rebuilt from the ledger's event log and export products and history back to CSV.
///
/// Set INVENTORY_LEDGER_IN_TEST_MODE to run against a seeded, in-memory ledger.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the inventory home directory and its configuration file.
    ///
    /// This is the first command you should run. You need the URL of a ledger gateway and the
    /// identity that will sign writes to the inventory contract.
    Init(InitArgs),
    /// Import products from a CSV or TSV file.
    ///
    /// The file needs a header row with product name, quantity and price columns. Rows that are
    /// malformed or have non-positive numbers are skipped. You are shown a preview and asked to
    /// confirm before anything is written.
    Import(ImportArgs),
    /// Add a single product.
    Add(AddArgs),
    /// Replace the name, quantity and price of a product.
    Update(UpdateArgs),
    /// Delete a product.
    Delete(IdArgs),
    /// Show one product, whether active or deleted.
    Product(IdArgs),
    /// List the active products.
    Products,
    /// Rebuild the transaction history from the ledger's event log and print it.
    History,
    /// Show the current stock value and the number of transactions.
    Stats,
    /// Write products, history or both to a CSV file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and snapshots are held. Defaults to ~/inventory
    #[arg(long, env = "INVENTORY_HOME", default_value_t = default_inventory_home())]
    inventory_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, inventory_home: PathBuf) -> Self {
        Self {
            log_level,
            inventory_home: inventory_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn inventory_home(&self) -> &DisplayPath {
        &self.inventory_home
    }
}

/// (Not shown): Args for the `inventory init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The JSON-RPC endpoint of the ledger gateway, e.g. http://localhost:8545
    #[arg(long)]
    ledger_url: Url,

    /// The identity that signs writes to the inventory contract.
    #[arg(long)]
    signer: String,
}

impl InitArgs {
    pub fn new(ledger_url: Url, signer: impl Into<String>) -> Self {
        Self {
            ledger_url,
            signer: signer.into(),
        }
    }

    pub fn ledger_url(&self) -> &Url {
        &self.ledger_url
    }

    pub fn signer(&self) -> &str {
        &self.signer
    }
}

/// (Not shown): Args for the `inventory import` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ImportArgs {
    /// The file to import. Reads stdin when omitted, in which case --yes or --dry-run is required.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Submit without asking for confirmation.
    #[arg(long, short)]
    yes: bool,

    /// Show the preview and stop.
    #[arg(long, conflicts_with = "yes")]
    dry_run: bool,
}

impl ImportArgs {
    pub fn new(file: Option<PathBuf>, yes: bool, dry_run: bool) -> Self {
        Self { file, yes, dry_run }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn yes(&self) -> bool {
        self.yes
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// (Not shown): Args for the `inventory add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The product name.
    name: String,
    /// The quantity in stock, greater than zero.
    quantity: u64,
    /// The price per unit, greater than zero.
    price: u64,
}

impl AddArgs {
    pub fn new(name: impl Into<String>, quantity: u64, price: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> u64 {
        self.price
    }
}

/// (Not shown): Args for the `inventory update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The product id.
    id: u64,
    #[clap(flatten)]
    product: AddArgs,
}

impl UpdateArgs {
    pub fn new(id: u64, name: impl Into<String>, quantity: u64, price: u64) -> Self {
        Self {
            id,
            product: AddArgs::new(name, quantity, price),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn product(&self) -> &AddArgs {
        &self.product
    }
}

/// (Not shown): Args for commands that take a product id.
#[derive(Debug, Parser, Clone, Copy)]
pub struct IdArgs {
    /// The product id.
    id: u64,
}

impl IdArgs {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// (Not shown): Args for the `inventory export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// What to export: products, history or all
    dataset: Dataset,

    /// The directory to write to. Defaults to `export_dir` from config.json, or the inventory home.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(dataset: Dataset, out: Option<PathBuf>) -> Self {
        Self { dataset, out }
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

fn default_inventory_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("inventory"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --inventory-home or INVENTORY_HOME instead of relying on the \
                default inventory home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("inventory")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
