use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::data::{DetailLevel, RawDailyPayload, Resource};
use crate::error::{PullError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROFILE_ENDPOINT: &str = "/1/user/-/profile.json";

/// Thin client over the Fitbit Web API endpoints needed for one day
pub struct FitbitApi {
    client: reqwest::Client,
    base_url: String,
}

impl FitbitApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PullError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn test_connection(&self, token: &str) -> Result<()> {
        self.get_json(token, PROFILE_ENDPOINT).await.map(|_| ())
    }

    /// Fetch all seven responses for `date`
    ///
    /// Requests run one after another; the first failure aborts the whole day.
    pub async fn fetch_day(&self, token: &str, date: NaiveDate) -> Result<RawDailyPayload> {
        Ok(RawDailyPayload {
            heart_sec: self.get_intraday(token, Resource::Heart, DetailLevel::Second, date).await?,
            heart_min: self.get_intraday(token, Resource::Heart, DetailLevel::Minute, date).await?,
            calories: self
                .get_intraday(token, Resource::Calories, DetailLevel::Minute, date)
                .await?,
            steps: self.get_intraday(token, Resource::Steps, DetailLevel::Minute, date).await?,
            floors: self.get_intraday(token, Resource::Floors, DetailLevel::Minute, date).await?,
            elevation: self
                .get_intraday(token, Resource::Elevation, DetailLevel::Minute, date)
                .await?,
            sleep: self.get_sleep(token, date).await?,
        })
    }

    pub async fn get_intraday(
        &self,
        token: &str,
        resource: Resource,
        detail: DetailLevel,
        date: NaiveDate,
    ) -> Result<Value> {
        let endpoint = format!(
            "/1/user/-/activities/{}/date/{}/1d/{}.json",
            resource.name(),
            date.format("%Y-%m-%d"),
            detail.as_str()
        );
        self.get_json(token, &endpoint).await
    }

    pub async fn get_sleep(&self, token: &str, date: NaiveDate) -> Result<Value> {
        let endpoint = format!("/1/user/-/sleep/date/{}.json", date.format("%Y-%m-%d"));
        self.get_json(token, &endpoint).await
    }

    async fn get_json(&self, token: &str, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "GET");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| PullError::fetch(endpoint, None, e.to_string()))?;

        let body = self.check_response(response, endpoint).await?;
        serde_json::from_str(&body).map_err(|e| {
            PullError::fetch(
                endpoint,
                None,
                format!("Failed to parse JSON: {} (body excerpt: {})", e, excerpt(&body, 200)),
            )
        })
    }

    async fn check_response(&self, response: reqwest::Response, endpoint: &str) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                "Empty response".to_string()
            } else {
                excerpt(&body, 500).to_string()
            };
            if status == StatusCode::UNAUTHORIZED {
                return Err(PullError::auth(format!(
                    "{} rejected the access token: {}",
                    endpoint, message
                )));
            }
            return Err(PullError::fetch(endpoint, Some(status.as_u16()), message));
        }

        response.text().await.map_err(|e| {
            PullError::fetch(
                endpoint,
                Some(status.as_u16()),
                format!("Failed to read response body: {}", e),
            )
        })
    }
}

fn excerpt(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
