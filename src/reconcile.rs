//! Rebuilds the transaction history from the ledger's event log.
//!
//! One pass fetches the `ProductAdded`, `ProductUpdated` and `ProductDeleted` logs concurrently,
//! merges them newest block first and resolves each entry's block time. The result replaces the
//! history held by a `HistoryStore`. If any fetch fails, the store is left as it was.

use crate::api::Inventory;
use crate::model::{
    EventKind, HistoryEntry, HistoryStats, HistoryStore, LedgerEvent, RawEvent, TransactionHistory,
};
use crate::Result;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs one reconciliation pass and stores its result in `store`.
pub async fn reconcile(inventory: &Inventory, store: &HistoryStore) -> Result<Arc<TransactionHistory>> {
    debug!("Fetching ledger events");
    let (added, updated, deleted) = tokio::try_join!(
        inventory.events(EventKind::Added),
        inventory.events(EventKind::Updated),
        inventory.events(EventKind::Deleted),
    )?;
    debug!(
        "Fetched {} added, {} updated and {} deleted events",
        added.len(),
        updated.len(),
        deleted.len()
    );

    let mut events = normalize(EventKind::Added, added)?;
    events.extend(normalize(EventKind::Updated, updated)?);
    events.extend(normalize(EventKind::Deleted, deleted)?);

    // Stable, so events within one block keep their per-kind order.
    events.sort_by(|a, b| b.block_number.cmp(&a.block_number));

    let entries = join_all(events.into_iter().map(|event| timestamped(inventory, event))).await;
    debug!("Reconciled {} history entries", entries.len());
    Ok(store.replace(TransactionHistory::new(entries)))
}

/// Runs a reconciliation pass and computes the statistics shown beside the history. The stock
/// value comes from a live scan of the active products, not from the history.
pub async fn stats(inventory: &Inventory, store: &HistoryStore) -> Result<HistoryStats> {
    let history = reconcile(inventory, store).await?;
    let current_stock_value = inventory.current_stock_value().await?;
    Ok(HistoryStats {
        current_stock_value,
        total_transactions: history.len(),
    })
}

fn normalize(kind: EventKind, raw: Vec<RawEvent>) -> Result<Vec<LedgerEvent>> {
    raw.into_iter()
        .map(|event| LedgerEvent::from_raw(kind, event))
        .collect()
}

async fn timestamped(inventory: &Inventory, event: LedgerEvent) -> HistoryEntry {
    let block_time = match inventory.block_time(event.block_number).await {
        Ok(time) => Some(time),
        Err(e) => {
            warn!("No timestamp for block {}: {e:#}", event.block_number);
            None
        }
    };
    HistoryEntry::new(event, block_time)
}
