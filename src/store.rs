//! SQLite sink for the daily tables
//!
//! Tables are append-only: a day that was already loaded is rejected by the
//! primary keys, and because every table for the day is written in one
//! transaction, a rejected day leaves nothing behind.

use std::path::Path;

use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, Connection, ToSql};

use crate::error::{PullError, Result};
use crate::tables::{Cell, DailyTables, TableView};

const TABLE_NAMES: [&str; 10] = [
    "daily_oor",
    "daily_fat_burn",
    "daily_cardio",
    "daily_peak",
    "daily_summary",
    "intraday",
    "heart",
    "sleep_stage",
    "sleep_summary",
    "sleep_misc",
];

const SCHEMA: &str = r#"
    CREATE TABLE daily_oor (
        date DATE PRIMARY KEY,
        "caloriesOut" REAL,
        max INTEGER,
        min INTEGER,
        minutes INTEGER
    );

    CREATE TABLE daily_fat_burn (
        date DATE PRIMARY KEY,
        "caloriesOut" REAL,
        max INTEGER,
        min INTEGER,
        minutes INTEGER
    );

    CREATE TABLE daily_cardio (
        date DATE PRIMARY KEY,
        "caloriesOut" REAL,
        max INTEGER,
        min INTEGER,
        minutes INTEGER
    );

    CREATE TABLE daily_peak (
        date DATE PRIMARY KEY,
        "caloriesOut" REAL,
        max INTEGER,
        min INTEGER,
        minutes INTEGER
    );

    CREATE TABLE daily_summary (
        datetime TIMESTAMP PRIMARY KEY,
        calories INTEGER,
        steps INTEGER,
        floors INTEGER,
        elevation INTEGER
    );

    CREATE TABLE intraday (
        datetime TIMESTAMP PRIMARY KEY,
        heart_min INTEGER,
        calories REAL,
        steps INTEGER,
        floors INTEGER,
        elevation REAL
    );

    CREATE TABLE heart (
        datetime TIMESTAMP PRIMARY KEY,
        value INTEGER
    );

    CREATE TABLE sleep_stage (
        datetime TIMESTAMP PRIMARY KEY,
        stage INTEGER
    );

    CREATE TABLE sleep_summary (
        date DATE PRIMARY KEY,
        deep REAL,
        light REAL,
        rem REAL,
        wake REAL,
        "totalMinutesAsleep" INTEGER,
        "totalTimeInBed" INTEGER
    );

    CREATE TABLE sleep_misc (
        date DATE PRIMARY KEY,
        "awakeCount" INTEGER,
        "awakeDuration" INTEGER,
        "awakeningsCount" INTEGER,
        efficiency INTEGER,
        "minutesToFallAsleep" INTEGER,
        "restlessCount" INTEGER,
        "restlessDuration" INTEGER
    );
"#;

/// Destination for one day's tables
pub trait TableSink {
    fn append_day(&mut self, tables: &DailyTables) -> Result<()>;
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Cell::Int(v) => v.to_sql(),
            Cell::Float(v) => v.to_sql(),
            Cell::Date(d) => d.to_sql(),
            Cell::Timestamp(t) => t.to_sql(),
        }
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file. The schema is not touched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| {
                PullError::Persistence(format!("Failed to open {}: {}", path.display(), e))
            })?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| {
                PullError::Persistence(format!("Failed to open in-memory database: {}", e))
            })?;
        Ok(Self { conn })
    }

    /// Drop and recreate every table. All stored data is lost.
    pub fn reset_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for name in TABLE_NAMES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", name))?;
        }
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        tracing::info!(tables = TABLE_NAMES.len(), "recreated schema");
        Ok(())
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        if !TABLE_NAMES.contains(&table) {
            return Err(PullError::Persistence(format!("Unknown table '{}'", table)));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

impl TableSink for SqliteStore {
    fn append_day(&mut self, tables: &DailyTables) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in tables.in_append_order() {
            append(&tx, table)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_sql(table: &dyn TableView) -> String {
    let columns: Vec<String> = table.columns().iter().map(|c| format!("\"{}\"", c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn append(conn: &Connection, table: &dyn TableView) -> Result<()> {
    let mut stmt = conn.prepare_cached(&insert_sql(table))?;
    for index in 0..table.row_count() {
        let cells = table.row_cells(index);
        stmt.execute(params_from_iter(cells.iter())).map_err(|e| {
            PullError::Persistence(format!("Failed to append to {}: {}", table.name(), e))
        })?;
    }
    tracing::debug!(table = table.name(), rows = table.row_count(), "appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures;

    #[test]
    fn test_insert_sql_quotes_columns() {
        let tables = DailyTables::build(&fixtures::payload(), fixtures::date()).unwrap();
        assert_eq!(
            insert_sql(&tables.heart_zones[0]),
            r#"INSERT INTO daily_oor ("date", "caloriesOut", "max", "min", "minutes") VALUES (?1, ?2, ?3, ?4, ?5)"#
        );
    }

    #[test]
    fn test_reset_schema_creates_empty_tables() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.reset_schema().unwrap();
        for name in TABLE_NAMES {
            assert_eq!(store.row_count(name).unwrap(), 0, "{}", name);
        }
    }

    #[test]
    fn test_reset_schema_discards_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.reset_schema().unwrap();
        let tables = DailyTables::build(&fixtures::payload(), fixtures::date()).unwrap();
        store.append_day(&tables).unwrap();
        assert_eq!(store.row_count("heart").unwrap(), 4);

        store.reset_schema().unwrap();
        assert_eq!(store.row_count("heart").unwrap(), 0);
    }

    #[test]
    fn test_null_cells_are_stored_as_null() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.reset_schema().unwrap();
        let tables = DailyTables::build(&fixtures::payload(), fixtures::date()).unwrap();
        store.append_day(&tables).unwrap();

        let nulls: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM intraday WHERE elevation IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 2);

        let stored: String = store
            .conn
            .query_row("SELECT datetime FROM daily_summary", [], |row| row.get(0))
            .unwrap();
        assert!(stored.starts_with("2019-03-02"), "{}", stored);
        assert!(stored.contains("00:00:00"), "{}", stored);
    }

    #[test]
    fn test_append_without_schema_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tables = DailyTables::build(&fixtures::payload(), fixtures::date()).unwrap();
        assert!(matches!(store.append_day(&tables), Err(PullError::Persistence(_))));
    }

    #[test]
    fn test_unknown_table_count_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.row_count("sqlite_master; DROP TABLE heart").is_err());
    }
}
