//! Flat tables built from one day's raw payload.
//!
//! Each builder is a pure function of the payload and the invocation date.
//! None of them reads another's output, so they may run in any order.

mod daily;
mod fields;
mod intraday;
mod sleep;

pub use daily::{build_daily_summary, build_heart_zones, DailySummaryRow, HeartZone, HeartZoneRow};
pub use intraday::{build_heart_samples, build_intraday, HeartRow, IntradayRow};
pub use sleep::{
    build_sleep_misc, build_sleep_stages, build_sleep_summary, SleepMiscRow, SleepStageRow,
    SleepSummaryRow,
};

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::RawDailyPayload;
use crate::error::Result;

/// A single typed value headed for the store
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(Option<i64>),
    Float(Option<f64>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// A row type with a fixed column set; the first column is the table key
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// Named rows of one type. An empty table still knows its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    pub name: &'static str,
    pub rows: Vec<R>,
}

impl<R: TableRow> Table<R> {
    pub fn new(name: &'static str, rows: Vec<R>) -> Self {
        Self { name, rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row-type-erased view used by sinks
pub trait TableView {
    fn name(&self) -> &'static str;
    fn columns(&self) -> &'static [&'static str];
    fn row_count(&self) -> usize;
    fn row_cells(&self, index: usize) -> Vec<Cell>;
}

impl<R: TableRow> TableView for Table<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_cells(&self, index: usize) -> Vec<Cell> {
        self.rows[index].cells()
    }
}

/// Every table produced for one day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTables {
    pub daily_summary: Table<DailySummaryRow>,
    pub heart_zones: Vec<Table<HeartZoneRow>>,
    pub sleep_summary: Table<SleepSummaryRow>,
    pub sleep_misc: Table<SleepMiscRow>,
    pub sleep_stage: Table<SleepStageRow>,
    pub heart: Table<HeartRow>,
    pub intraday: Table<IntradayRow>,
}

impl DailyTables {
    pub fn build(payload: &RawDailyPayload, date: NaiveDate) -> Result<Self> {
        Ok(Self {
            daily_summary: build_daily_summary(payload, date)?,
            heart_zones: build_heart_zones(payload, date)?,
            sleep_summary: build_sleep_summary(payload, date)?,
            sleep_misc: build_sleep_misc(payload, date)?,
            sleep_stage: build_sleep_stages(payload, date)?,
            heart: build_heart_samples(payload, date)?,
            intraday: build_intraday(payload, date)?,
        })
    }

    /// All physical tables in the order they are appended to the store
    pub fn in_append_order(&self) -> Vec<&dyn TableView> {
        let mut tables: Vec<&dyn TableView> = Vec::with_capacity(6 + self.heart_zones.len());
        tables.push(&self.sleep_stage);
        tables.push(&self.heart);
        tables.push(&self.intraday);
        tables.push(&self.daily_summary);
        tables.extend(self.heart_zones.iter().map(|t| t as &dyn TableView));
        tables.push(&self.sleep_summary);
        tables.push(&self.sleep_misc);
        tables
    }

    pub fn row_counts(&self) -> Vec<(&'static str, usize)> {
        self.in_append_order()
            .into_iter()
            .map(|t| (t.name(), t.row_count()))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::data::RawDailyPayload;
    use chrono::NaiveDate;

    pub(crate) const FIXTURE_DAY: &str = include_str!("../../tests/fixtures/day.json");

    pub(crate) fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 2).unwrap()
    }

    pub(crate) fn payload() -> RawDailyPayload {
        serde_json::from_str(FIXTURE_DAY).unwrap()
    }
}
