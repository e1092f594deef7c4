use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;
use url::Url;

/// Creates the inventory home directory, its `.snapshots` subdirectory and an initial
/// `config.json`.
///
/// # Arguments
/// - `inventory_home` - The directory that will be the root of the data directory, e.g.
///   `$HOME/inventory`
/// - `ledger_url` - The JSON-RPC endpoint of the ledger gateway.
/// - `signer` - The identity that signs writes to the inventory contract.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(inventory_home: &Path, ledger_url: &Url, signer: &str) -> Result<Out<()>> {
    let config = Config::create(inventory_home, ledger_url.clone(), signer)
        .await
        .context("Unable to create the inventory directory and config")?;
    Ok(format!(
        "Successfully created the inventory directory and config at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("inv");
        let url = Url::parse("http://localhost:8545").unwrap();
        let out = init(&home, &url, "0xsigner").await.unwrap();
        assert!(out.message().starts_with("Successfully created"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.signer(), "0xsigner");
    }
}
