//! Types that represent the core data model, such as `Product`, `LedgerEvent` and
//! `TransactionHistory`.
mod event;
mod history;
mod mapping;
mod product;

pub use event::{Change, EventKind, LedgerEvent, ProductLine, RawEvent};
pub use history::{HistoryEntry, HistoryStats, HistoryStore, TransactionHistory, UNKNOWN};
pub use mapping::{ColumnMapping, Field};
pub use product::{CandidateRecord, Product};

use crate::Result;
use anyhow::{bail, Context};
use serde_json::Value;

/// Ledger values for unsigned integers may arrive either as JSON numbers or as decimal strings
/// (large integers are commonly stringified to survive JSON number precision).
pub(crate) fn uint(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .with_context(|| format!("Expected an unsigned integer, got {n}")),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Expected an unsigned integer, got '{s}'")),
        other => bail!("Expected an unsigned integer, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uint() {
        assert_eq!(uint(&json!(42)).unwrap(), 42);
        assert_eq!(uint(&json!("42")).unwrap(), 42);
        assert!(uint(&json!(-1)).is_err());
        assert!(uint(&json!("4x")).is_err());
        assert!(uint(&json!(null)).is_err());
    }
}
