//! Saves each reconciled history to the snapshots directory and rotates old copies.

use crate::model::TransactionHistory;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of history snapshot files.
pub const HISTORY: &str = "history";

const EXTENSION: &str = "json";

/// Writes history snapshots named `history.YYYY-MM-DD-NNN.json`, keeping at most `copies` of them.
/// Create one with `Config::snapshot()`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    dir: PathBuf,
    copies: u32,
}

impl Snapshot {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.snapshots().to_path_buf(),
            copies: config.snapshot_copies(),
        }
    }

    /// Saves `history` as pretty-printed JSON, removes the oldest snapshots beyond the configured
    /// number of copies and returns the path of the new file.
    pub async fn save(&self, history: &TransactionHistory) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(&date).await?;
        let path = self.dir.join(format!("{HISTORY}.{date}-{seq:03}.{EXTENSION}"));

        let json =
            serde_json::to_string_pretty(history).context("Failed to serialize the history")?;
        utils::write(&path, json).await?;
        debug!("Saved history snapshot {}", path.display());

        self.rotate().await?;
        Ok(path)
    }

    /// Returns one more than the highest sequence number used today.
    async fn next_sequence_number(&self, date: &str) -> Result<u32> {
        let max_seq = snapshot_names(&self.dir)
            .await?
            .iter()
            .filter_map(|name| parse_sequence_number(name, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    async fn rotate(&self) -> Result<()> {
        let mut names = snapshot_names(&self.dir).await?;
        // The names sort by date, then sequence number.
        names.sort();
        let to_delete = names.len().saturating_sub(self.copies as usize);
        for name in names.into_iter().take(to_delete) {
            utils::remove(self.dir.join(&name)).await?;
            debug!("Removed old history snapshot {name}");
        }
        Ok(())
    }
}

async fn snapshot_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = utils::read_dir(dir).await?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("Failed to read directory entry")?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_snapshot_file(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the `NNN` of `history.{date}-NNN.json`, or `None` if `filename` is not a snapshot from
/// `date`.
fn parse_sequence_number(filename: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{HISTORY}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_snapshot_file(filename: &str) -> bool {
    filename.starts_with(&format!("{HISTORY}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("history.2025-12-14-001.json", "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("history.2025-12-14-042.json", "2025-12-14"),
            Some(42)
        );
        assert_eq!(
            parse_sequence_number("history.2025-12-13-001.json", "2025-12-14"),
            None
        );
        assert_eq!(
            parse_sequence_number("history.2025-12-14-001.txt", "2025-12-14"),
            None
        );
        assert_eq!(
            parse_sequence_number("other.2025-12-14-001.json", "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_snapshot_file() {
        assert!(is_snapshot_file("history.2025-12-14-001.json"));
        assert!(!is_snapshot_file("history.2025-12-14-001"));
        assert!(!is_snapshot_file("config.json"));
    }

    #[tokio::test]
    async fn test_save_and_rotate() {
        let dir = TempDir::new().unwrap();
        let snapshot = Snapshot {
            dir: dir.path().to_path_buf(),
            copies: 2,
        };
        let history = TransactionHistory::default();
        let first = snapshot.save(&history).await.unwrap();
        let second = snapshot.save(&history).await.unwrap();
        let third = snapshot.save(&history).await.unwrap();

        assert!(first.to_string_lossy().ends_with("-001.json"));
        assert!(third.to_string_lossy().ends_with("-003.json"));
        assert!(!first.exists());
        assert!(second.is_file());
        assert!(third.is_file());

        let saved: TransactionHistory = utils::deserialize(&third).await.unwrap();
        assert_eq!(saved, history);
    }
}
