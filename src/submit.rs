//! Writes an accepted batch of candidate records to the ledger, one record at a time.

use crate::api::Inventory;
use crate::model::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// The pause after each submitted record.
pub const SUBMIT_DELAY: Duration = Duration::from_millis(500);

/// A record the ledger did not accept, with the reason it gave.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FailedRecord {
    pub name: String,
    pub message: String,
}

/// The outcome of one submission run.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImportReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<FailedRecord>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Submits records sequentially, pausing for `delay` after every record.
#[derive(Debug, Clone, Copy)]
pub struct Submitter {
    delay: Duration,
}

impl Default for Submitter {
    fn default() -> Self {
        Self {
            delay: SUBMIT_DELAY,
        }
    }
}

impl Submitter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Writes each record with `addProduct`. A failed write is logged and counted and the run moves
    /// on to the next record. Records are never submitted concurrently.
    pub async fn submit(&self, records: &[CandidateRecord], inventory: &Inventory) -> ImportReport {
        let mut report = ImportReport::default();
        for (i, record) in records.iter().enumerate() {
            debug!("Submitting record {} of {}", i + 1, records.len());
            match inventory
                .add_product(record.name(), record.quantity(), record.price())
                .await
            {
                Ok(receipt) => {
                    debug!(
                        "Added '{}' in block {} ({})",
                        record.name(),
                        receipt.block_number,
                        receipt.transaction_hash
                    );
                    report.success_count += 1;
                }
                Err(e) => {
                    error!("Error adding product '{}': {e:#}", record.name());
                    report.failure_count += 1;
                    report.failures.push(FailedRecord {
                        name: record.name().to_string(),
                        message: format!("{e:#}"),
                    });
                }
            }
            sleep(self.delay).await;
        }
        info!(
            "Submitted {} records: {} added, {} failed",
            report.total(),
            report.success_count,
            report.failure_count
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Failures, TestLedger};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn records(names: &[&str]) -> Vec<CandidateRecord> {
        names
            .iter()
            .map(|name| CandidateRecord::new(*name, 2, 3))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_counts() {
        let ledger = TestLedger::with_failures(
            Failures::default()
                .fail_writes_for("Broken")
                .fail_writes_for("Cracked"),
        );
        let inventory = Inventory::new(Arc::new(ledger), "0xsigner");
        let batch = records(&["A", "Broken", "B", "Cracked", "C"]);

        let report = Submitter::default().submit(&batch, &inventory).await;

        assert_eq!(report.total(), batch.len());
        assert_eq!(report.success_count, 3);
        assert_eq!(report.failure_count, 2);
        assert_eq!(report.failures[0].name, "Broken");
        assert!(report.failures[0].message.contains("rejected"));
        assert_eq!(inventory.total_products().await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submissions_keep_input_order() {
        let inventory = Inventory::new(Arc::new(TestLedger::default()), "0xsigner");
        let batch = records(&["First", "Second", "Third"]);
        Submitter::default().submit(&batch, &inventory).await;
        for (i, name) in ["First", "Second", "Third"].iter().enumerate() {
            let product = inventory.get_product(i as u64 + 1).await.unwrap();
            assert_eq!(product.name(), *name);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_after_every_record() {
        let ledger = TestLedger::with_failures(Failures::default().fail_writes_for("Bad"));
        let inventory = Inventory::new(Arc::new(ledger), "0xsigner");
        let batch = records(&["Good", "Bad", "Good again"]);
        let submitter = Submitter::default();
        assert_eq!(submitter.delay(), SUBMIT_DELAY);
        let start = Instant::now();
        submitter.submit(&batch, &inventory).await;
        assert!(start.elapsed() >= submitter.delay() * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let inventory = Inventory::new(Arc::new(TestLedger::default()), "0xsigner");
        let report = Submitter::new(Duration::ZERO).submit(&[], &inventory).await;
        assert_eq!(report, ImportReport::default());
    }
}
