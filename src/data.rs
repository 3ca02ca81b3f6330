use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Resources ───────────────────────────────────────────

/// Activity resources exposed by the intraday time-series endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Heart,
    Calories,
    Steps,
    Floors,
    Elevation,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::Heart => "heart",
            Resource::Calories => "calories",
            Resource::Steps => "steps",
            Resource::Floors => "floors",
            Resource::Elevation => "elevation",
        }
    }

    /// JSON pointer to the daily aggregate array, e.g. `/activities-steps`
    pub fn summary_pointer(self) -> String {
        format!("/activities-{}", self.name())
    }

    /// JSON pointer to the intraday samples, e.g. `/activities-steps-intraday/dataset`
    pub fn dataset_pointer(self) -> String {
        format!("/activities-{}-intraday/dataset", self.name())
    }
}

/// Sampling resolution requested from the intraday endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Second,
    Minute,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Second => "1sec",
            DetailLevel::Minute => "1min",
        }
    }
}

// ── Raw payload ─────────────────────────────────────────

/// Every response needed to build one day of tables, kept as returned by the API.
///
/// The intraday responses differ only in their key prefixes, and the sleep
/// response has optional parts that vary with the tracker and API version, so
/// the builders pick fields out by JSON pointer instead of a fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDailyPayload {
    pub heart_sec: Value,
    pub heart_min: Value,
    pub calories: Value,
    pub steps: Value,
    pub floors: Value,
    pub elevation: Value,
    pub sleep: Value,
}

/// Names used for the payload slots in logs and errors
pub const HEART_SEC: &str = "heart_sec";
pub const HEART_MIN: &str = "heart_min";
pub const SLEEP: &str = "sleep";

impl RawDailyPayload {
    /// Minute-resolution response for an intraday resource
    pub fn minute_response(&self, resource: Resource) -> &Value {
        match resource {
            Resource::Heart => &self.heart_min,
            Resource::Calories => &self.calories,
            Resource::Steps => &self.steps,
            Resource::Floors => &self.floors,
            Resource::Elevation => &self.elevation,
        }
    }
}

// ── Snapshot ────────────────────────────────────────────

/// Local copy of the most recent fetch, replayed when debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    pub payload: RawDailyPayload,
}
