use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::fields::{float_at, int_at};
use super::{Cell, Table, TableRow};
use crate::data::{RawDailyPayload, Resource, HEART_SEC};
use crate::error::Result;

// ── Daily summary ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummaryRow {
    /// Midnight of the invocation date
    pub datetime: NaiveDateTime,
    pub calories: i64,
    pub steps: i64,
    pub floors: i64,
    pub elevation: i64,
}

impl TableRow for DailySummaryRow {
    const COLUMNS: &'static [&'static str] =
        &["datetime", "calories", "steps", "floors", "elevation"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Timestamp(self.datetime),
            Cell::Int(Some(self.calories)),
            Cell::Int(Some(self.steps)),
            Cell::Int(Some(self.floors)),
            Cell::Int(Some(self.elevation)),
        ]
    }
}

pub fn build_daily_summary(
    payload: &RawDailyPayload,
    date: NaiveDate,
) -> Result<Table<DailySummaryRow>> {
    let total = |resource: Resource| {
        let pointer = format!("{}/0/value", resource.summary_pointer());
        int_at(payload.minute_response(resource), resource.name(), &pointer)
    };

    let row = DailySummaryRow {
        datetime: date.and_time(NaiveTime::MIN),
        calories: total(Resource::Calories)?,
        steps: total(Resource::Steps)?,
        floors: total(Resource::Floors)?,
        elevation: total(Resource::Elevation)?,
    };

    Ok(Table::new("daily_summary", vec![row]))
}

// ── Heart-rate zones ────────────────────────────────────

/// Zones in the order the API lists them under `heartRateZones`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartZone {
    OutOfRange,
    FatBurn,
    Cardio,
    Peak,
}

impl HeartZone {
    pub const ALL: [HeartZone; 4] = [
        HeartZone::OutOfRange,
        HeartZone::FatBurn,
        HeartZone::Cardio,
        HeartZone::Peak,
    ];

    pub fn index(self) -> usize {
        match self {
            HeartZone::OutOfRange => 0,
            HeartZone::FatBurn => 1,
            HeartZone::Cardio => 2,
            HeartZone::Peak => 3,
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            HeartZone::OutOfRange => "daily_oor",
            HeartZone::FatBurn => "daily_fat_burn",
            HeartZone::Cardio => "daily_cardio",
            HeartZone::Peak => "daily_peak",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeartZoneRow {
    pub date: NaiveDate,
    pub calories_out: f64,
    pub max: i64,
    pub min: i64,
    pub minutes: i64,
}

impl TableRow for HeartZoneRow {
    const COLUMNS: &'static [&'static str] = &["date", "caloriesOut", "max", "min", "minutes"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.date),
            Cell::Float(Some(self.calories_out)),
            Cell::Int(Some(self.max)),
            Cell::Int(Some(self.min)),
            Cell::Int(Some(self.minutes)),
        ]
    }
}

/// One single-row table per zone, each read from its own `heartRateZones` entry
pub fn build_heart_zones(
    payload: &RawDailyPayload,
    date: NaiveDate,
) -> Result<Vec<Table<HeartZoneRow>>> {
    HeartZone::ALL
        .iter()
        .map(|&zone| -> Result<Table<HeartZoneRow>> {
            let base = format!("/activities-heart/0/value/heartRateZones/{}", zone.index());
            let field = |name: &str| format!("{}/{}", base, name);
            let row = HeartZoneRow {
                date,
                calories_out: float_at(&payload.heart_sec, HEART_SEC, &field("caloriesOut"))?,
                max: int_at(&payload.heart_sec, HEART_SEC, &field("max"))?,
                min: int_at(&payload.heart_sec, HEART_SEC, &field("min"))?,
                minutes: int_at(&payload.heart_sec, HEART_SEC, &field("minutes"))?,
            };
            Ok(Table::new(zone.table_name(), vec![row]))
        })
        .collect()
}
