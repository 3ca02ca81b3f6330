use chrono::NaiveDate;

use crate::error::Result;
use crate::source::PayloadSource;
use crate::store::TableSink;
use crate::tables::DailyTables;

/// Rows written per table for one successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub row_counts: Vec<(&'static str, usize)>,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.row_counts.iter().map(|(_, n)| n).sum()
    }
}

/// Fetch, reshape and store one day.
///
/// Nothing is written unless every table builds; the sink then decides how
/// the writes themselves are grouped.
pub async fn run_day(
    source: &dyn PayloadSource,
    sink: &mut dyn TableSink,
    date: NaiveDate,
) -> Result<RunSummary> {
    tracing::info!(%date, "pulling day");
    let payload = source.fetch(date).await?;

    let tables = DailyTables::build(&payload, date)?;
    let row_counts = tables.row_counts();
    for (table, rows) in &row_counts {
        tracing::info!(table, rows, "built");
    }

    sink.append_day(&tables)?;

    let summary = RunSummary { date, row_counts };
    tracing::info!(%date, rows = summary.total_rows(), "stored day");
    Ok(summary)
}
