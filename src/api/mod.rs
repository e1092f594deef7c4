//! The `Ledger` trait and its implementations.
//!
//! `RpcLedger` talks to a ledger gateway over JSON-RPC. `TestLedger` keeps everything in memory
//! and is used by the tests and by the CLI when `INVENTORY_LEDGER_IN_TEST_MODE` is set.

mod inventory;
mod rpc_ledger;
mod test_ledger;

pub use inventory::Inventory;
pub(crate) use rpc_ledger::RpcLedger;
pub use test_ledger::{Failures, TestLedger};

use crate::model::{EventKind, RawEvent};
use crate::{Config, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const TEST_MODE_ENV: &str = "INVENTORY_LEDGER_IN_TEST_MODE";

/// Selects the `Ledger` implementation the CLI uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Talk to the ledger gateway configured in `config.json`.
    #[default]
    Rpc,
    /// Use a seeded, in-memory ledger.
    Test,
}

impl Mode {
    /// `Mode::Test` when `INVENTORY_LEDGER_IN_TEST_MODE` is set and non-empty, `Mode::Rpc`
    /// otherwise.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Rpc,
        }
    }
}

/// A block height, or the most recent block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BlockTag {
    Number(u64),
    Latest,
}

impl BlockTag {
    pub fn includes(&self, block_number: u64) -> bool {
        match self {
            BlockTag::Number(n) => block_number <= *n,
            BlockTag::Latest => true,
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            BlockTag::Number(n) => serializer.serialize_u64(*n),
            BlockTag::Latest => serializer.serialize_str("latest"),
        }
    }
}

/// An inclusive range of blocks to read events from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: BlockTag,
}

impl BlockRange {
    /// Genesis to the latest block.
    pub const fn all() -> Self {
        Self {
            from_block: 0,
            to_block: BlockTag::Latest,
        }
    }

    pub fn contains(&self, block_number: u64) -> bool {
        block_number >= self.from_block && self.to_block.includes(block_number)
    }
}

/// Acknowledgement of a write that the ledger accepted.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// The parts of a block header this tool needs.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

/// The operations the inventory needs from the ledger. Methods take `&self` so that independent
/// reads can be in flight at the same time.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Submits a state-changing contract call signed by `signer`.
    async fn send_write(&self, method: &str, args: &[Value], signer: &str) -> Result<TxReceipt>;

    /// Performs a read-only contract call and returns its output tuple.
    async fn call(&self, method: &str, args: &[Value]) -> Result<Vec<Value>>;

    /// Returns the events of `kind` recorded within `range`, in ledger order.
    async fn past_events(&self, kind: EventKind, range: BlockRange) -> Result<Vec<RawEvent>>;

    /// Looks up a block header.
    async fn block(&self, number: u64) -> Result<Block>;
}

/// Creates the `Ledger` selected by `mode`.
pub fn ledger(config: &Config, mode: Mode) -> Result<Arc<dyn Ledger>> {
    debug!("Using ledger mode {mode:?}");
    match mode {
        Mode::Rpc => Ok(Arc::new(RpcLedger::new(config.ledger_url().clone())?)),
        Mode::Test => Ok(Arc::new(TestLedger::seeded()?)),
    }
}
