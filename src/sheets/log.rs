use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use super::SheetsApi;
use crate::source::Cell;
use crate::window::DateWindow;

pub const LOG_TAB: &str = "Log";

/// Current log schema. Rewritten over row 1 on every run; rows appended
/// under older, narrower schemas are left as they are.
pub const LOG_HEADER: [&str; 7] = [
    "Run Timestamp (UTC)",
    "Budget Start Date",
    "Budget End Date",
    "Budget Row Count",
    "TimeEntries Start Date",
    "TimeEntries End Date",
    "TimeEntries Row Count",
];

/// What one dataset contributed to a run.
#[derive(Debug, Clone, Copy)]
pub struct DatasetOutcome {
    pub window: DateWindow,
    pub row_count: usize,
}

/// One appended log row: the run timestamp plus a (start, end, count)
/// triple per dataset processed, in dataset order.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_at: DateTime<Utc>,
    pub outcomes: Vec<DatasetOutcome>,
}

impl RunSummary {
    /// Render in the fixed header column order, padding columns for
    /// datasets that were not active this run.
    pub fn to_row(&self) -> Vec<Cell> {
        let mut row = Vec::with_capacity(LOG_HEADER.len());
        row.push(Cell::from(
            self.run_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        for outcome in &self.outcomes {
            row.push(Cell::from(outcome.window.start().to_string()));
            row.push(Cell::from(outcome.window.end().to_string()));
            row.push(Cell::Number(outcome.row_count as f64));
        }
        while row.len() < LOG_HEADER.len() {
            row.push(Cell::empty());
        }
        row
    }
}

/// Make sure the log destination exists and carries the current header
/// schema. Creating the tab only happens when it is absent; the header
/// rewrite is unconditional and touches row 1 only.
pub async fn ensure_log_tab<S: SheetsApi>(sheets: &S) -> Result<()> {
    let titles = sheets
        .sheet_titles()
        .await
        .context("listing tabs while ensuring the log sheet")?;
    if !titles.iter().any(|t| t == LOG_TAB) {
        sheets
            .add_sheet(LOG_TAB)
            .await
            .context("creating the log tab")?;
        info!(tab = LOG_TAB, "log tab created");
    }

    let header: Vec<Cell> = LOG_HEADER.iter().map(|h| Cell::from(*h)).collect();
    sheets
        .update(&format!("{LOG_TAB}!A1"), &[header])
        .await
        .context("writing the log header row")
}

/// Append one summary row. Insert-only: existing rows are never disturbed.
pub async fn append_run<S: SheetsApi>(sheets: &S, summary: &RunSummary) -> Result<()> {
    sheets
        .append(LOG_TAB, &[summary.to_row()])
        .await
        .context("appending the run log row")?;
    info!(datasets = summary.outcomes.len(), "run logged");
    Ok(())
}
