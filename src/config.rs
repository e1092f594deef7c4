//! Configuration file handling.
//!
//! The configuration file is stored at `$INVENTORY_HOME/config.json` and holds the ledger gateway
//! URL, the signer identity, submission pacing and snapshot settings.

use crate::snapshot::Snapshot;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "inventory";
const CONFIG_VERSION: u8 = 1;
const SUBMIT_DELAY_MS: u64 = 500;
const SNAPSHOT_COPIES: u32 = 5;
const SNAPSHOTS: &str = ".snapshots";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$INVENTORY_HOME` and from there it loads `$INVENTORY_HOME/config.json`. It
/// provides paths to other items that are expected in a certain location within the home
/// directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    snapshots: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its `.snapshots` subdirectory and an initial `config.json`
    /// holding `ledger_url`, `signer` and default settings.
    ///
    /// # Errors
    /// - Returns an error if `signer` is empty or if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, ledger_url: Url, signer: &str) -> Result<Self> {
        ensure!(!signer.trim().is_empty(), "The signer cannot be empty");

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the inventory home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let snapshots = root.join(SNAPSHOTS);
        utils::make_dir(&snapshots).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::new(ledger_url, signer.trim());
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            snapshots,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the snapshots directory exists
    pub async fn load(inventory_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = inventory_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Inventory home is missing. Run `inventory init` first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            snapshots: root.join(SNAPSHOTS),
            root,
            config_path,
            config_file,
        };
        if !config.snapshots.is_dir() {
            bail!(
                "The snapshots directory is missing '{}'",
                config.snapshots.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn snapshots(&self) -> &Path {
        &self.snapshots
    }

    pub fn ledger_url(&self) -> &Url {
        &self.config_file.ledger_url
    }

    pub fn signer(&self) -> &str {
        &self.config_file.signer
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.config_file.submit_delay_ms)
    }

    pub fn snapshot_copies(&self) -> u32 {
        self.config_file.snapshot_copies
    }

    /// The directory exports are written to. A relative `export_dir` is resolved against the
    /// home directory, and the home directory itself is used when none is configured.
    pub fn export_dir(&self) -> PathBuf {
        match &self.config_file.export_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.clone(),
        }
    }

    /// Creates a new `Snapshot` instance for saving history snapshots.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "inventory",
///   "config_version": 1,
///   "ledger_url": "http://localhost:8545/",
///   "signer": "0x90F79bf6EB2c4f870365E785982E1f101E93b906",
///   "submit_delay_ms": 500,
///   "snapshot_copies": 5,
///   "export_dir": "exports"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "inventory"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// JSON-RPC endpoint of the ledger gateway
    ledger_url: Url,

    /// The identity that signs writes
    signer: String,

    /// Pause after each submitted record during an import
    #[serde(default = "default_submit_delay_ms")]
    submit_delay_ms: u64,

    /// Number of history snapshots to keep
    #[serde(default = "default_snapshot_copies")]
    snapshot_copies: u32,

    /// Where exports are written (optional, relative to the home directory or absolute)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    export_dir: Option<PathBuf>,
}

fn default_submit_delay_ms() -> u64 {
    SUBMIT_DELAY_MS
}

fn default_snapshot_copies() -> u32 {
    SNAPSHOT_COPIES
}

impl ConfigFile {
    fn new(ledger_url: Url, signer: impl Into<String>) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            ledger_url,
            signer: signer.into(),
            submit_delay_ms: SUBMIT_DELAY_MS,
            snapshot_copies: SNAPSHOT_COPIES,
            export_dir: None,
        }
    }

    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            !config.signer.is_empty(),
            "The config file at {} has no signer",
            path.display()
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url() -> Url {
        Url::parse("http://127.0.0.1:8545/").unwrap()
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("inventory_home");

        let config = Config::create(&home_dir, url(), " 0xsigner ").await.unwrap();

        assert_eq!(config.ledger_url(), &url());
        assert_eq!(config.signer(), "0xsigner");
        assert_eq!(config.submit_delay(), Duration::from_millis(500));
        assert_eq!(config.snapshot_copies(), 5);
        assert!(config.snapshots().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.export_dir(), config.root());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path(), url(), "me").await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.config_file, loaded.config_file);
        assert_eq!(created.root(), loaded.root());
    }

    #[tokio::test]
    async fn test_config_create_requires_signer() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path(), url(), "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let e = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(e.to_string().contains("inventory init"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "inventory",
            "config_version": 1,
            "ledger_url": "https://ledger.example.com/rpc",
            "signer": "0xabc"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config.ledger_url.as_str(), "https://ledger.example.com/rpc");
        assert_eq!(config.submit_delay_ms, SUBMIT_DELAY_MS);
        assert_eq!(config.snapshot_copies, SNAPSHOT_COPIES);
        assert!(config.export_dir.is_none());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "ledger_url": "https://ledger.example.com/rpc",
            "signer": "0xabc"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let e = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(e.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "inventory",
            "config_version": 1,
            "ledger_url": "not a url",
            "signer": "0xabc"
        }"#;
        utils::write(&config_path, json).await.unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::new(url(), "me")).unwrap();
        assert!(!json.contains("export_dir"));
    }

    #[tokio::test]
    async fn test_export_dir_resolution() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path(), url(), "me").await.unwrap();
        config.config_file.export_dir = Some(PathBuf::from("exports"));
        assert_eq!(config.export_dir(), config.root().join("exports"));
        let absolute = dir.path().join("elsewhere");
        config.config_file.export_dir = Some(absolute.clone());
        assert_eq!(config.export_dir(), absolute);
    }
}
