//! End-to-end runs of one day through sources, builders and the SQLite store

mod common;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use common::{config_for, fixture_date, fixture_payload, mount_day, ACCESS_TOKEN};
use fitbit_pull::auth::Tokens;
use fitbit_pull::data::{RawDailyPayload, Snapshot};
use fitbit_pull::pipeline::run_day;
use fitbit_pull::source::{LiveSource, PayloadSource, SnapshotSource};
use fitbit_pull::store::{SqliteStore, TableSink};
use fitbit_pull::tables::DailyTables;
use fitbit_pull::{PullError, Result};
use wiremock::MockServer;

struct FixtureSource(RawDailyPayload);

#[async_trait]
impl PayloadSource for FixtureSource {
    async fn fetch(&self, _date: NaiveDate) -> Result<RawDailyPayload> {
        Ok(self.0.clone())
    }
}

struct ExpiredSource;

#[async_trait]
impl PayloadSource for ExpiredSource {
    async fn fetch(&self, _date: NaiveDate) -> Result<RawDailyPayload> {
        Err(PullError::auth("refresh token revoked"))
    }
}

fn fresh_store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.reset_schema().unwrap();
    store
}

#[tokio::test]
async fn test_run_day_appends_every_table() {
    let mut store = fresh_store();

    let summary = run_day(&FixtureSource(fixture_payload()), &mut store, fixture_date())
        .await
        .expect("run succeeds");

    assert_eq!(summary.date, fixture_date());
    assert_eq!(summary.total_rows(), 5 + 4 + 4 + 1 + 4 + 1 + 1);
    for (table, rows) in &summary.row_counts {
        assert_eq!(store.row_count(table).unwrap(), *rows as i64, "{}", table);
    }
}

#[tokio::test]
async fn test_rerunning_a_day_is_rejected_without_partial_writes() {
    let mut store = fresh_store();
    let source = FixtureSource(fixture_payload());
    run_day(&source, &mut store, fixture_date()).await.unwrap();

    let err = run_day(&source, &mut store, fixture_date()).await.unwrap_err();

    assert!(matches!(err, PullError::Persistence(_)));
    assert_eq!(store.row_count("sleep_stage").unwrap(), 5);
    assert_eq!(store.row_count("daily_summary").unwrap(), 1);
}

#[tokio::test]
async fn test_failure_on_last_table_rolls_back_earlier_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fitbit.db");
    let mut store = SqliteStore::open(&db_path).unwrap();
    store.reset_schema().unwrap();

    // sleep_misc is appended last; make it collide
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute(
        r#"INSERT INTO sleep_misc (date, "awakeCount") VALUES ('2019-03-02', 0)"#,
        [],
    )
    .unwrap();
    drop(conn);

    let err = run_day(&FixtureSource(fixture_payload()), &mut store, fixture_date())
        .await
        .unwrap_err();

    assert!(matches!(err, PullError::Persistence(ref m) if m.contains("sleep_misc")), "{}", err);
    let untouched = [
        "sleep_stage",
        "heart",
        "intraday",
        "daily_summary",
        "daily_peak",
        "sleep_summary",
    ];
    for table in untouched {
        assert_eq!(store.row_count(table).unwrap(), 0, "{}", table);
    }
    assert_eq!(store.row_count("sleep_misc").unwrap(), 1);
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let mut store = fresh_store();

    let err = run_day(&ExpiredSource, &mut store, fixture_date()).await.unwrap_err();

    assert!(matches!(err, PullError::Authentication(_)));
    assert_eq!(store.row_count("heart").unwrap(), 0);
}

#[tokio::test]
async fn test_builder_failure_writes_nothing() {
    let mut store = fresh_store();
    let mut payload = fixture_payload();
    payload.steps = serde_json::json!({});

    let err = run_day(&FixtureSource(payload), &mut store, fixture_date())
        .await
        .unwrap_err();

    assert!(matches!(err, PullError::MissingField { .. }));
    assert_eq!(store.row_count("sleep_stage").unwrap(), 0);
}

#[tokio::test]
async fn test_empty_sleep_day_stores_no_misc_row() {
    let mut store = fresh_store();
    let mut payload = fixture_payload();
    payload.sleep = serde_json::json!({
        "sleep": [],
        "summary": {"totalMinutesAsleep": 0, "totalSleepRecords": 0, "totalTimeInBed": 0}
    });

    run_day(&FixtureSource(payload), &mut store, fixture_date()).await.unwrap();

    assert_eq!(store.row_count("sleep_misc").unwrap(), 0);
    assert_eq!(store.row_count("sleep_stage").unwrap(), 0);
    assert_eq!(store.row_count("sleep_summary").unwrap(), 1);
}

#[tokio::test]
async fn test_snapshot_source_replays_saved_payload() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), None);
    config
        .save_snapshot(&Snapshot {
            date: fixture_date(),
            fetched_at: Utc::now(),
            payload: fixture_payload(),
        })
        .unwrap();

    let replayed = SnapshotSource::new(config)
        .fetch(fixture_date())
        .await
        .unwrap();

    assert_eq!(replayed, fixture_payload());
}

#[tokio::test]
async fn test_snapshot_for_another_day_is_still_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), None);
    config
        .save_snapshot(&Snapshot {
            date: fixture_date(),
            fetched_at: Utc::now(),
            payload: fixture_payload(),
        })
        .unwrap();

    let next_day = NaiveDate::from_ymd_opt(2019, 3, 3).unwrap();
    let replayed = SnapshotSource::new(config).fetch(next_day).await;

    assert_eq!(replayed.expect("replay proceeds"), fixture_payload());
}

#[tokio::test]
async fn test_snapshot_source_without_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = SnapshotSource::new(config_for(dir.path(), None));

    let err = source.fetch(fixture_date()).await.unwrap_err();

    assert!(matches!(err, PullError::Snapshot(_)));
}

#[tokio::test]
async fn test_live_fetch_then_replay_builds_identical_tables() {
    let server = MockServer::start().await;
    mount_day(&server, &fixture_payload()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), Some(&server.uri()));
    config
        .save_tokens(&Tokens {
            access_token: ACCESS_TOKEN.to_string(),
            refresh_token: Some("test-refresh-token".to_string()),
            expires_at: Utc::now() + Duration::hours(8),
        })
        .unwrap();

    let live = LiveSource::new(config.clone())
        .unwrap()
        .fetch(fixture_date())
        .await
        .expect("live fetch");
    assert!(config.snapshot_path().exists());

    let replayed = SnapshotSource::new(config).fetch(fixture_date()).await.unwrap();

    assert_eq!(
        DailyTables::build(&live, fixture_date()).unwrap(),
        DailyTables::build(&replayed, fixture_date()).unwrap()
    );
}

#[tokio::test]
async fn test_live_source_without_tokens_is_not_authenticated() {
    let dir = tempfile::tempdir().unwrap();
    let source = LiveSource::new(config_for(dir.path(), Some("http://127.0.0.1:9"))).unwrap();

    let err = source.fetch(fixture_date()).await.unwrap_err();

    assert!(matches!(err, PullError::NotAuthenticated));
}

#[test]
fn test_sink_trait_object_accepts_store() {
    let mut store = fresh_store();
    let sink: &mut dyn TableSink = &mut store;
    let tables = DailyTables::build(&fixture_payload(), fixture_date()).unwrap();
    sink.append_day(&tables).unwrap();
    assert_eq!(store.row_count("intraday").unwrap(), 4);
}
