use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::Tokens;
use crate::data::Snapshot;
use crate::error::{PullError, Result};

const DATA_DIR_NAME: &str = "fitbit-pull";
const TOKENS_FILE: &str = "tokens.json";
const SNAPSHOT_FILE: &str = "latest_raw.json";
const DATABASE_FILE: &str = "fitbit.db";
pub const DEFAULT_API_BASE: &str = "https://api.fitbit.com";

/// Where the raw daily payload comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Fetch from the Fitbit API and refresh the local snapshot
    #[default]
    Live,
    /// Replay the last saved snapshot without touching the network
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub source: SourceMode,
    pub api_base: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("FITBIT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or_else(|| PullError::config("Could not determine data directory"))?
                .join(DATA_DIR_NAME),
        };

        let database = lookup("FITBIT_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE));

        let source = match lookup("FITBIT_SOURCE") {
            Some(raw) => <SourceMode as clap::ValueEnum>::from_str(&raw, true)
                .map_err(|_| PullError::config(format!("Unknown FITBIT_SOURCE '{}'", raw)))?,
            None => SourceMode::default(),
        };

        Ok(Config {
            client_id: lookup("FITBIT_CLIENT_ID"),
            client_secret: lookup("FITBIT_CLIENT_SECRET"),
            data_dir,
            database,
            source,
            api_base: lookup("FITBIT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.data_dir.join(TOKENS_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn save_tokens(&self, tokens: &Tokens) -> Result<()> {
        self.ensure_data_dir()?;
        let json = serde_json::to_string_pretty(tokens)?;
        fs::write(self.tokens_path(), json)?;
        Ok(())
    }

    pub fn load_tokens(&self) -> Result<Tokens> {
        let json = fs::read_to_string(self.tokens_path())?;
        let tokens: Tokens = serde_json::from_str(&json)?;
        Ok(tokens)
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_data_dir()?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.snapshot_path(), json)?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Snapshot> {
        let path = self.snapshot_path();
        let json = fs::read_to_string(&path).map_err(|e| {
            PullError::Snapshot(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| PullError::Snapshot(format!("Failed to parse {}: {}", path.display(), e)))
    }
}
