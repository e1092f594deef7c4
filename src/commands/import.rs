use crate::api::Inventory;
use crate::args::ImportArgs;
use crate::commands::Out;
use crate::import::{parse_batch, ParsedBatch, SkippedRow};
use crate::model::CandidateRecord;
use crate::submit::{ImportReport, Submitter};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::info;

/// What an import run parsed and, if it got that far, what it submitted.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub records: Vec<CandidateRecord>,
    pub skipped: Vec<SkippedRow>,
    pub report: Option<ImportReport>,
}

impl ImportOutcome {
    fn new(batch: ParsedBatch, report: Option<ImportReport>) -> Self {
        Self {
            skipped: batch.skipped().to_vec(),
            records: batch.into_records(),
            report,
        }
    }
}

/// Parses the import source once, shows a preview and, once confirmed, submits the parsed records
/// one at a time.
///
/// The source is `args.file()` or, when no file is given, stdin. Confirmation is read from stdin
/// unless `--yes` is given, so reading the source from stdin requires `--yes` or `--dry-run`.
pub async fn import(
    config: &Config,
    inventory: &Inventory,
    args: &ImportArgs,
) -> Result<Out<ImportOutcome>> {
    let raw = match args.file() {
        Some(path) => utils::read(path).await?,
        None => {
            if !args.yes() && !args.dry_run() {
                bail!("Reading the import from stdin requires --yes or --dry-run");
            }
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Unable to read the import from stdin")?;
            raw
        }
    };

    let batch = parse_batch(&raw).context("Unable to parse the import")?;
    info!("{}", preview(&batch));

    if args.dry_run() {
        let message = format!(
            "Dry run: {} products ready to import, nothing was submitted.",
            batch.records().len()
        );
        return Ok(Out::new(message, ImportOutcome::new(batch, None)));
    }

    if !args.yes() && !confirm(batch.records().len()).await? {
        return Ok(Out::new("Import cancelled.", ImportOutcome::new(batch, None)));
    }

    let report = Submitter::new(config.submit_delay())
        .submit(batch.records(), inventory)
        .await;
    let message = format!(
        "Import complete! {} products added, {} failed.",
        report.success_count, report.failure_count
    );
    Ok(Out::new(message, ImportOutcome::new(batch, Some(report))))
}

/// The numbered list of products that will be imported, followed by the rows that were skipped.
pub fn preview(batch: &ParsedBatch) -> String {
    let mut lines = vec![format!(
        "Found {} valid products to import:",
        batch.records().len()
    )];
    lines.extend(batch.records().iter().enumerate().map(|(i, r)| {
        format!(
            "{}. {} | Qty: {} | Price: {}",
            i + 1,
            r.name(),
            r.quantity(),
            r.price()
        )
    }));
    if !batch.skipped().is_empty() {
        lines.push(format!("Skipped {} rows:", batch.skipped().len()));
        lines.extend(batch.skipped().iter().map(ToString::to_string));
    }
    lines.join("\n")
}

async fn confirm(count: usize) -> Result<bool> {
    info!("Submit {count} products to the ledger? Each one is a separate transaction. [y/N]");
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Unable to read the confirmation from stdin")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Failures, TestLedger};
    use crate::test::TestEnv;

    const STOCK: &str = "Product Name,Quantity,Price\n\
                         Widget,10,5\n\
                         Broken,3,3\n\
                         Gadget,0,4\n\
                         \"Bolts, large\",100,1\n";

    #[tokio::test(start_paused = true)]
    async fn test_import_file() {
        let env = TestEnv::new().await;
        let path = env.write_file("stock.csv", STOCK).await;
        let inventory = env.inventory_with(TestLedger::with_failures(
            Failures::default().fail_writes_for("Broken"),
        ));

        let out = import(&env.config(), &inventory, &ImportArgs::new(Some(path), true, false))
            .await
            .unwrap();

        assert_eq!(out.message(), "Import complete! 2 products added, 1 failed.");
        let outcome = out.structure().unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 4);
        assert_eq!(outcome.report.as_ref().unwrap().failure_count, 1);
        assert_eq!(inventory.total_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_submits_nothing() {
        let env = TestEnv::new().await;
        let path = env.write_file("stock.csv", STOCK).await;
        let inventory = env.inventory_with(TestLedger::default());

        let out = import(&env.config(), &inventory, &ImportArgs::new(Some(path), false, true))
            .await
            .unwrap();

        assert!(out.message().starts_with("Dry run: 3 products"));
        assert!(out.structure().unwrap().report.is_none());
        assert_eq!(inventory.total_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_parse_error_is_reported() {
        let env = TestEnv::new().await;
        let path = env.write_file("bad.tsv", "Name\tQty\tPrice\nWidget\tabc\t5\n").await;
        let inventory = env.inventory_with(TestLedger::default());
        let e = import(&env.config(), &inventory, &ImportArgs::new(Some(path), true, false))
            .await
            .unwrap_err();
        assert!(format!("{e:#}").contains("No valid products"));
    }

    #[tokio::test]
    async fn test_stdin_requires_yes_or_dry_run() {
        let env = TestEnv::new().await;
        let inventory = env.inventory_with(TestLedger::default());
        assert!(import(&env.config(), &inventory, &ImportArgs::default())
            .await
            .is_err());
    }

    #[test]
    fn test_preview() {
        let batch = parse_batch("Product Name,Quantity,Price\nWidget,10,5\n,1,1\n").unwrap();
        assert_eq!(
            preview(&batch),
            "Found 1 valid products to import:\n\
             1. Widget | Qty: 10 | Price: 5\n\
             Skipped 1 rows:\n\
             Row 3: Skipping - Invalid data (Name: \"\", Qty: 1, Price: 1)"
        );
    }
}
