use crate::model::{Change, EventKind, LedgerEvent};
use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The timestamp shown for an entry whose block could not be looked up.
pub const UNKNOWN: &str = "Unknown";

/// A ledger event enriched with the wall-clock time of the block it was recorded in.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryEntry {
    #[serde(flatten)]
    event: LedgerEvent,
    /// `None` when the block lookup failed.
    block_time: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    pub fn new(event: LedgerEvent, block_time: Option<DateTime<Utc>>) -> Self {
        Self { event, block_time }
    }

    pub fn event(&self) -> &LedgerEvent {
        &self.event
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn product_id(&self) -> u64 {
        self.event.change.product_id()
    }

    pub fn product_name(&self) -> &str {
        self.event
            .change
            .line()
            .map(|line| line.product_name.as_str())
            .unwrap_or_default()
    }

    pub fn quantity(&self) -> u64 {
        self.event.change.line().map(|l| l.quantity).unwrap_or(0)
    }

    pub fn price(&self) -> u64 {
        self.event.change.line().map(|l| l.price).unwrap_or(0)
    }

    /// Always `quantity * price`, which is zero for deletions.
    pub fn total_value(&self) -> u128 {
        match &self.event.change {
            Change::Added(line) | Change::Updated(line) => {
                u128::from(line.quantity) * u128::from(line.price)
            }
            Change::Deleted { .. } => 0,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.event.block_number
    }

    pub fn transaction_hash(&self) -> &str {
        &self.event.transaction_hash
    }

    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        self.block_time
    }

    /// The block time in the local timezone, or `Unknown`.
    pub fn timestamp(&self) -> String {
        match self.block_time {
            Some(t) => t
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => UNKNOWN.to_string(),
        }
    }
}

/// All known history entries, newest block first.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHistory {
    entries: Vec<HistoryEntry>,
}

impl TransactionHistory {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

/// Aggregate figures shown alongside the history.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryStats {
    /// Sum of `quantity * price` over the products that are active on the ledger right now.
    pub current_stock_value: u128,
    pub total_transactions: usize,
}

/// Holds the most recent `TransactionHistory`. Clones share the same slot. Writers swap in a whole
/// new history, so a reader sees either the previous history or the next one, never a mix.
#[derive(Default, Debug, Clone)]
pub struct HistoryStore {
    current: Arc<RwLock<Arc<TransactionHistory>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current history. The returned value does not change if the store is replaced.
    pub fn current(&self) -> Arc<TransactionHistory> {
        self.current.read().clone()
    }

    /// Replaces the stored history and returns the new one.
    pub fn replace(&self, history: TransactionHistory) -> Arc<TransactionHistory> {
        let history = Arc::new(history);
        *self.current.write() = history.clone();
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductLine;

    fn entry(change: Change, block_number: u64, block_time: Option<DateTime<Utc>>) -> HistoryEntry {
        HistoryEntry::new(
            LedgerEvent {
                change,
                block_number,
                transaction_hash: "0xabc".to_string(),
            },
            block_time,
        )
    }

    fn line(quantity: u64, price: u64) -> ProductLine {
        ProductLine {
            product_id: 1,
            product_name: "Widget".to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn test_total_value() {
        assert_eq!(entry(Change::Added(line(10, 5)), 1, None).total_value(), 50);
        assert_eq!(entry(Change::Updated(line(3, 7)), 1, None).total_value(), 21);
        let deleted = entry(Change::Deleted { product_id: 1 }, 1, None);
        assert_eq!(deleted.total_value(), 0);
        assert_eq!(deleted.product_name(), "");
        assert_eq!(deleted.quantity(), 0);
    }

    #[test]
    fn test_timestamp_unknown() {
        let e = entry(Change::Deleted { product_id: 1 }, 1, None);
        assert_eq!(e.timestamp(), UNKNOWN);
        let e = entry(
            Change::Deleted { product_id: 1 },
            1,
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0),
        );
        assert_ne!(e.timestamp(), UNKNOWN);
    }

    #[test]
    fn test_store_replace() {
        let store = HistoryStore::new();
        assert!(store.current().is_empty());
        let before = store.current();
        let reader = store.clone();
        store.replace(TransactionHistory::new(vec![entry(
            Change::Added(line(1, 1)),
            4,
            None,
        )]));
        assert!(before.is_empty());
        assert_eq!(reader.current().len(), 1);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let e = entry(Change::Added(line(2, 3)), 11, None);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "added");
        assert_eq!(json["product_name"], "Widget");
        assert_eq!(json["block_number"], 11);
    }
}
