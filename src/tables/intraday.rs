use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use super::fields::{array_at, sample, sample_value_pointer, to_float, to_int};
use super::{Cell, Table, TableRow};
use crate::data::{RawDailyPayload, Resource, HEART_MIN, HEART_SEC};
use crate::error::Result;

// ── Per-second heart rate ───────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HeartRow {
    pub datetime: NaiveDateTime,
    pub value: i64,
}

impl TableRow for HeartRow {
    const COLUMNS: &'static [&'static str] = &["datetime", "value"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::Timestamp(self.datetime), Cell::Int(Some(self.value))]
    }
}

/// One row per second-resolution sample, in the order received
pub fn build_heart_samples(payload: &RawDailyPayload, date: NaiveDate) -> Result<Table<HeartRow>> {
    let base = Resource::Heart.dataset_pointer();
    let rows = array_at(&payload.heart_sec, HEART_SEC, &base)?
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<HeartRow> {
            let (datetime, value) = sample(item, date, HEART_SEC, &base, index, "time")?;
            let value = to_int(value, HEART_SEC, &sample_value_pointer(&base, index))?;
            Ok(HeartRow { datetime, value })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table::new("heart", rows))
}

// ── Minute-resolution join ──────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct IntradayRow {
    pub datetime: NaiveDateTime,
    pub heart_min: Option<i64>,
    pub calories: Option<f64>,
    pub steps: Option<i64>,
    pub floors: Option<i64>,
    pub elevation: Option<f64>,
}

impl IntradayRow {
    fn empty(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            heart_min: None,
            calories: None,
            steps: None,
            floors: None,
            elevation: None,
        }
    }
}

impl TableRow for IntradayRow {
    const COLUMNS: &'static [&'static str] = &[
        "datetime",
        "heart_min",
        "calories",
        "steps",
        "floors",
        "elevation",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Timestamp(self.datetime),
            Cell::Int(self.heart_min),
            Cell::Float(self.calories),
            Cell::Int(self.steps),
            Cell::Int(self.floors),
            Cell::Float(self.elevation),
        ]
    }
}

const MINUTE_SERIES: [Resource; 5] = [
    Resource::Heart,
    Resource::Calories,
    Resource::Steps,
    Resource::Floors,
    Resource::Elevation,
];

/// Outer join of the five minute-level series on timestamp.
///
/// The series are sampled independently and may differ in length, so rows
/// are keyed by time, never by position. A column is `None` wherever its
/// series has no sample; a repeated timestamp within one series keeps the
/// later sample. Rows come out in timestamp order.
pub fn build_intraday(payload: &RawDailyPayload, date: NaiveDate) -> Result<Table<IntradayRow>> {
    let mut rows: BTreeMap<NaiveDateTime, IntradayRow> = BTreeMap::new();

    for resource in MINUTE_SERIES {
        let label = match resource {
            Resource::Heart => HEART_MIN,
            other => other.name(),
        };
        let base = resource.dataset_pointer();

        let dataset = array_at(payload.minute_response(resource), label, &base)?;
        for (index, item) in dataset.iter().enumerate() {
            let (datetime, value) = sample(item, date, label, &base, index, "time")?;
            let pointer = sample_value_pointer(&base, index);
            let row = rows.entry(datetime).or_insert_with(|| IntradayRow::empty(datetime));

            match resource {
                Resource::Heart => row.heart_min = Some(to_int(value, label, &pointer)?),
                Resource::Calories => row.calories = Some(to_float(value, label, &pointer)?),
                Resource::Steps => row.steps = Some(to_int(value, label, &pointer)?),
                Resource::Floors => row.floors = Some(to_int(value, label, &pointer)?),
                Resource::Elevation => row.elevation = Some(to_float(value, label, &pointer)?),
            }
        }
    }

    Ok(Table::new("intraday", rows.into_values().collect()))
}
