use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::FitbitApi;
use crate::auth::AuthManager;
use crate::config::{Config, SourceMode};
use crate::data::{RawDailyPayload, Snapshot};
use crate::error::Result;

/// Producer of the raw payload for one day
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<RawDailyPayload>;
}

/// Fetches from the Fitbit API and keeps the result as the local snapshot
pub struct LiveSource {
    api: FitbitApi,
    auth: AuthManager,
    config: Config,
}

impl LiveSource {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            api: FitbitApi::new(&config.api_base)?,
            auth: AuthManager::new(config.clone()),
            config,
        })
    }
}

#[async_trait]
impl PayloadSource for LiveSource {
    async fn fetch(&self, date: NaiveDate) -> Result<RawDailyPayload> {
        let token = self.auth.get_access_token().await?;
        let payload = self.api.fetch_day(&token, date).await?;

        let snapshot = Snapshot {
            date,
            fetched_at: chrono::Utc::now(),
            payload,
        };
        self.config.save_snapshot(&snapshot)?;
        tracing::debug!(path = %self.config.snapshot_path().display(), "saved snapshot");

        Ok(snapshot.payload)
    }
}

/// Replays the snapshot written by the last live fetch
pub struct SnapshotSource {
    config: Config,
}

impl SnapshotSource {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PayloadSource for SnapshotSource {
    async fn fetch(&self, date: NaiveDate) -> Result<RawDailyPayload> {
        let snapshot = self.config.load_snapshot()?;
        if snapshot.date != date {
            tracing::warn!(
                snapshot_date = %snapshot.date,
                requested = %date,
                "replaying a snapshot fetched for a different day"
            );
        }
        tracing::info!(fetched_at = %snapshot.fetched_at, "replaying snapshot");
        Ok(snapshot.payload)
    }
}

/// Source selected by `config.source`
pub fn from_config(config: &Config) -> Result<Box<dyn PayloadSource>> {
    Ok(match config.source {
        SourceMode::Live => Box::new(LiveSource::new(config.clone())?),
        SourceMode::Snapshot => Box::new(SnapshotSource::new(config.clone())),
    })
}
