//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::Path;

use chrono::NaiveDate;
use fitbit_pull::config::Config;
use fitbit_pull::data::RawDailyPayload;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "test-access-token";

pub fn fixture_payload() -> RawDailyPayload {
    serde_json::from_str(include_str!("../fixtures/day.json")).expect("fixture parses")
}

pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 3, 2).unwrap()
}

/// Config rooted at `data_dir`, optionally pointed at a mock API
pub fn config_for(data_dir: &Path, api_base: Option<&str>) -> Config {
    let data_dir = data_dir.to_string_lossy().to_string();
    let api_base = api_base.map(str::to_string);
    Config::from_lookup(move |key| match key {
        "FITBIT_DATA_DIR" => Some(data_dir.clone()),
        "FITBIT_API_BASE" => api_base.clone(),
        "FITBIT_CLIENT_ID" => Some("22TEST".to_string()),
        "FITBIT_CLIENT_SECRET" => Some("secret".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Mount the seven responses for the fixture day
pub async fn mount_day(server: &MockServer, payload: &RawDailyPayload) {
    let responses = [
        ("/1/user/-/activities/heart/date/2019-03-02/1d/1sec.json", &payload.heart_sec),
        ("/1/user/-/activities/heart/date/2019-03-02/1d/1min.json", &payload.heart_min),
        ("/1/user/-/activities/calories/date/2019-03-02/1d/1min.json", &payload.calories),
        ("/1/user/-/activities/steps/date/2019-03-02/1d/1min.json", &payload.steps),
        ("/1/user/-/activities/floors/date/2019-03-02/1d/1min.json", &payload.floors),
        ("/1/user/-/activities/elevation/date/2019-03-02/1d/1min.json", &payload.elevation),
        ("/1/user/-/sleep/date/2019-03-02.json", &payload.sleep),
    ];

    for (endpoint, body) in responses {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}
