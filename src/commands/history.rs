use crate::api::Inventory;
use crate::commands::Out;
use crate::export::group_thousands;
use crate::model::{Change, HistoryEntry, HistoryStats, HistoryStore, TransactionHistory};
use crate::{reconcile, Config, Result};
use tracing::debug;

/// Rebuilds the transaction history from the ledger, saves a snapshot of it and prints it newest
/// first.
pub async fn history(
    config: &Config,
    inventory: &Inventory,
    store: &HistoryStore,
) -> Result<Out<TransactionHistory>> {
    let history = reconcile::reconcile(inventory, store).await?;
    save_snapshot(config, &history).await?;

    let mut lines = vec![format!("{} transactions", history.len())];
    lines.extend(history.iter().map(describe));
    Ok(Out::new(lines.join("\n"), history.as_ref().clone()))
}

/// Rebuilds the transaction history and reports the live stock value and the transaction count.
pub async fn stats(
    config: &Config,
    inventory: &Inventory,
    store: &HistoryStore,
) -> Result<Out<HistoryStats>> {
    let stats = reconcile::stats(inventory, store).await?;
    save_snapshot(config, &store.current()).await?;
    let message = format!(
        "Current stock value: {}\nTotal transactions: {}",
        group_thousands(stats.current_stock_value),
        stats.total_transactions
    );
    Ok(Out::new(message, stats))
}

pub(super) async fn save_snapshot(config: &Config, history: &TransactionHistory) -> Result<()> {
    let path = config.snapshot().save(history).await?;
    debug!("History snapshot saved to {}", path.display());
    Ok(())
}

fn describe(entry: &HistoryEntry) -> String {
    let head = format!(
        "[{}] block {} {} product {}",
        entry.timestamp(),
        entry.block_number(),
        entry.kind().action(),
        entry.product_id()
    );
    match &entry.event().change {
        Change::Added(line) | Change::Updated(line) => format!(
            "{head}: {} (Qty: {}, Price: {}, Value: {}) {}",
            line.product_name,
            line.quantity,
            line.price,
            group_thousands(entry.total_value()),
            entry.transaction_hash()
        ),
        Change::Deleted { .. } => format!("{head} {}", entry.transaction_hash()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Failures, TestLedger};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_history_saves_snapshot() {
        let env = TestEnv::new().await;
        let inventory = env.inventory();
        let store = HistoryStore::new();

        let out = history(&env.config(), &inventory, &store).await.unwrap();

        assert!(out.message().starts_with("7 transactions\n"));
        assert_eq!(out.structure().unwrap().len(), 7);
        assert_eq!(env.snapshot_count().await, 1);
        let first_line = out.message().lines().nth(1).unwrap();
        assert!(first_line.contains("block 7 delete product 4"));
    }

    #[tokio::test]
    async fn test_stats() {
        let env = TestEnv::new().await;
        let out = stats(&env.config(), &env.inventory(), &HistoryStore::new())
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            "Current stock value: 7,900\nTotal transactions: 7"
        );
        assert_eq!(env.snapshot_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_pass_saves_nothing() {
        let env = TestEnv::new().await;
        let inventory = env.inventory_with(TestLedger::with_failures(
            Failures::default().fail_events(),
        ));
        assert!(history(&env.config(), &inventory, &HistoryStore::new())
            .await
            .is_err());
        assert_eq!(env.snapshot_count().await, 0);
    }
}
