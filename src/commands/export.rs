use crate::api::Inventory;
use crate::args::ExportArgs;
use crate::commands::history::save_snapshot;
use crate::commands::Out;
use crate::export::{self, Dataset, Summary};
use crate::model::{HistoryStore, Product};
use crate::{reconcile, utils, Config, Result};
use anyhow::bail;
use chrono::{Local, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Where an export was written and how many rows of each kind it holds.
#[derive(Debug, Clone, Serialize)]
pub struct Exported {
    pub path: PathBuf,
    pub products: usize,
    pub transactions: usize,
}

/// Writes the chosen dataset to `inventory_<dataset>_<date>.csv` in `args.out()`, or in the
/// configured export directory.
pub async fn export(
    config: &Config,
    inventory: &Inventory,
    store: &HistoryStore,
    args: &ExportArgs,
) -> Result<Out<Exported>> {
    let now = Local::now();
    let (document, products, transactions) = match args.dataset() {
        Dataset::Products => {
            let products = inventory.active_products().await?;
            (export::products_document(&products), products.len(), 0)
        }
        Dataset::History => {
            let history = reconcile::reconcile(inventory, store).await?;
            save_snapshot(config, &history).await?;
            if history.is_empty() {
                bail!("No transactions to export");
            }
            (export::history_document(history.entries()), 0, history.len())
        }
        Dataset::Complete => {
            let history = reconcile::reconcile(inventory, store).await?;
            save_snapshot(config, &history).await?;
            let products = inventory.active_products().await?;
            let summary = Summary {
                export_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                total_products: products.len(),
                total_transactions: history.len(),
                current_stock_value: products.iter().map(Product::total_value).sum(),
            };
            let document = export::complete_document(&summary, &products, history.entries());
            (document, products.len(), history.len())
        }
    };

    let dir = match args.out() {
        Some(dir) => dir.to_path_buf(),
        None => config.export_dir(),
    };
    utils::make_dir(&dir).await?;
    // File names carry the UTC date, the summary carries local time.
    let path = dir.join(args.dataset().file_name(Utc::now().date_naive()));
    utils::write(&path, document).await?;

    Ok(Out::new(
        format!("Exported {} to {}", args.dataset(), path.display()),
        Exported {
            path,
            products,
            transactions,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestLedger;
    use crate::export::BOM;
    use crate::import;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_export_products_then_import() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(Dataset::Products, None);
        let out = export(&env.config(), &env.inventory(), &HistoryStore::new(), &args)
            .await
            .unwrap();

        let exported = out.structure().unwrap();
        assert_eq!(exported.products, 4);
        assert!(exported.path.starts_with(env.config().root()));
        assert_eq!(
            exported.path.file_name().unwrap().to_string_lossy(),
            Dataset::Products.file_name(Utc::now().date_naive())
        );
        let text = utils::read(&exported.path).await.unwrap();
        assert!(text.starts_with(BOM));
        let records = import::parse(&text).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].name(), "Steel Bolt M6");
    }

    #[tokio::test]
    async fn test_export_complete_to_out_dir() {
        let env = TestEnv::new().await;
        let out_dir = env.config().root().join("exports");
        let args = ExportArgs::new(Dataset::Complete, Some(out_dir.clone()));
        let out = export(&env.config(), &env.inventory(), &HistoryStore::new(), &args)
            .await
            .unwrap();

        let exported = out.structure().unwrap();
        assert_eq!(exported.path.parent().unwrap(), out_dir);
        assert!(exported
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("inventory_complete_"));
        let text = utils::read(&exported.path).await.unwrap();
        assert!(text.contains("Total Transactions,7\n"));
        assert!(text.contains("Current Stock Value,\"7,900\"\n"));
        assert!(text.contains("\n--- PRODUCTS ---\n"));
        assert!(text.contains("\n\n--- TRANSACTION HISTORY ---\n"));
        assert!(text.contains("\ndelete,4,,0,0,0,"));
    }

    #[tokio::test]
    async fn test_export_empty_history_fails() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(Dataset::History, None);
        let e = export(
            &env.config(),
            &env.inventory_with(TestLedger::default()),
            &HistoryStore::new(),
            &args,
        )
        .await
        .unwrap_err();
        assert_eq!(e.to_string(), "No transactions to export");
    }
}
