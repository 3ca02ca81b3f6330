use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::fields::{array_at, int_at, opt_float_at, sample, sample_value_pointer, to_int};
use super::{Cell, Table, TableRow};
use crate::data::{RawDailyPayload, SLEEP};
use crate::error::{PullError, Result};

// ── Summary ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SleepSummaryRow {
    pub date: NaiveDate,
    pub deep: Option<f64>,
    pub light: Option<f64>,
    pub rem: Option<f64>,
    pub wake: Option<f64>,
    pub total_minutes_asleep: i64,
    pub total_time_in_bed: i64,
}

impl TableRow for SleepSummaryRow {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "deep",
        "light",
        "rem",
        "wake",
        "totalMinutesAsleep",
        "totalTimeInBed",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.date),
            Cell::Float(self.deep),
            Cell::Float(self.light),
            Cell::Float(self.rem),
            Cell::Float(self.wake),
            Cell::Int(Some(self.total_minutes_asleep)),
            Cell::Int(Some(self.total_time_in_bed)),
        ]
    }
}

/// Stage minutes are null when the response carries no stage breakdown
pub fn build_sleep_summary(
    payload: &RawDailyPayload,
    date: NaiveDate,
) -> Result<Table<SleepSummaryRow>> {
    let sleep = &payload.sleep;
    let has_stages = matches!(sleep.pointer("/summary/stages"), Some(v) if !v.is_null());
    let stage = |name: &str| -> Result<Option<f64>> {
        if has_stages {
            opt_float_at(sleep, SLEEP, &format!("/summary/stages/{}", name))
        } else {
            Ok(None)
        }
    };

    let row = SleepSummaryRow {
        date,
        deep: stage("deep")?,
        light: stage("light")?,
        rem: stage("rem")?,
        wake: stage("wake")?,
        total_minutes_asleep: int_at(sleep, SLEEP, "/summary/totalMinutesAsleep")?,
        total_time_in_bed: int_at(sleep, SLEEP, "/summary/totalTimeInBed")?,
    };

    Ok(Table::new("sleep_summary", vec![row]))
}

// ── Misc episode statistics ─────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SleepMiscRow {
    pub date: NaiveDate,
    pub awake_count: i64,
    pub awake_duration: i64,
    pub awakenings_count: i64,
    pub efficiency: i64,
    pub minutes_to_fall_asleep: i64,
    pub restless_count: i64,
    pub restless_duration: i64,
}

impl TableRow for SleepMiscRow {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "awakeCount",
        "awakeDuration",
        "awakeningsCount",
        "efficiency",
        "minutesToFallAsleep",
        "restlessCount",
        "restlessDuration",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.date),
            Cell::Int(Some(self.awake_count)),
            Cell::Int(Some(self.awake_duration)),
            Cell::Int(Some(self.awakenings_count)),
            Cell::Int(Some(self.efficiency)),
            Cell::Int(Some(self.minutes_to_fall_asleep)),
            Cell::Int(Some(self.restless_count)),
            Cell::Int(Some(self.restless_duration)),
        ]
    }
}

/// At most one row per date.
///
/// With several episodes the counts and durations are summed, while
/// `efficiency` and `minutesToFallAsleep` come from the main sleep (or the
/// first episode when none is flagged). No episodes gives an empty table.
pub fn build_sleep_misc(payload: &RawDailyPayload, date: NaiveDate) -> Result<Table<SleepMiscRow>> {
    let sleep = &payload.sleep;
    let episodes = array_at(sleep, SLEEP, "/sleep")?;
    if episodes.is_empty() {
        return Ok(Table::new("sleep_misc", Vec::new()));
    }

    let pointer = |episode: usize, key: &str| format!("/sleep/{}/{}", episode, key);
    let field = |episode: usize, key: &str| int_at(sleep, SLEEP, &pointer(episode, key));
    let sum = |key: &str| -> Result<i64> {
        (0..episodes.len()).try_fold(0i64, |total, episode| {
            total.checked_add(field(episode, key)?).ok_or_else(|| {
                PullError::invalid(SLEEP, &pointer(episode, key), "total overflows an integer")
            })
        })
    };

    let main = episodes
        .iter()
        .position(|e| e.get("isMainSleep").and_then(Value::as_bool) == Some(true))
        .unwrap_or(0);

    let row = SleepMiscRow {
        date,
        awake_count: sum("awakeCount")?,
        awake_duration: sum("awakeDuration")?,
        awakenings_count: sum("awakeningsCount")?,
        efficiency: field(main, "efficiency")?,
        minutes_to_fall_asleep: field(main, "minutesToFallAsleep")?,
        restless_count: sum("restlessCount")?,
        restless_duration: sum("restlessDuration")?,
    };

    Ok(Table::new("sleep_misc", vec![row]))
}

// ── Per-minute stages ───────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SleepStageRow {
    pub datetime: NaiveDateTime,
    pub stage: i64,
}

impl TableRow for SleepStageRow {
    const COLUMNS: &'static [&'static str] = &["datetime", "stage"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::Timestamp(self.datetime), Cell::Int(Some(self.stage))]
    }
}

/// Every episode's `minuteData`, flattened in episode order
pub fn build_sleep_stages(
    payload: &RawDailyPayload,
    date: NaiveDate,
) -> Result<Table<SleepStageRow>> {
    let sleep = &payload.sleep;
    let episodes = array_at(sleep, SLEEP, "/sleep")?;

    let mut rows = Vec::new();
    for episode in 0..episodes.len() {
        let base = format!("/sleep/{}/minuteData", episode);
        for (index, item) in array_at(sleep, SLEEP, &base)?.iter().enumerate() {
            let (datetime, value) = sample(item, date, SLEEP, &base, index, "dateTime")?;
            let stage = to_int(value, SLEEP, &sample_value_pointer(&base, index))?;
            rows.push(SleepStageRow { datetime, stage });
        }
    }

    Ok(Table::new("sleep_stage", rows))
}
