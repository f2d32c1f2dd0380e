use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::query;
use crate::sheets::log::{self, DatasetOutcome, RunSummary};
use crate::sheets::{writer, SheetsApi};
use crate::source::QueryExecutor;
use crate::window::{self, DateWindow, WindowPolicy};

pub const BUDGET_TAB: &str = "BudgetData";
pub const TIME_ENTRIES_TAB: &str = "TimeEntriesData";

/// One dataset to sync: a window, the query it renders to, and the tab the
/// result replaces.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: &'static str,
    pub tab: &'static str,
    pub window: DateWindow,
    pub query: String,
}

/// Decide what this run covers. The budget dataset is always present, on
/// the configured window policy; the weekly time-entries dataset is
/// optional. Windows derive from one shared `today` so a run straddling
/// midnight cannot skew between datasets.
pub fn plan(policy: WindowPolicy, include_time_entries: bool, today: NaiveDate) -> Vec<Dataset> {
    let budget_window = policy.window(today);
    let mut datasets = vec![Dataset {
        label: "budget",
        tab: BUDGET_TAB,
        window: budget_window,
        query: query::budget_query(&budget_window),
    }];

    if include_time_entries {
        let week = window::previous_iso_week(today);
        datasets.push(Dataset {
            label: "time entries",
            tab: TIME_ENTRIES_TAB,
            window: week,
            query: query::time_entries_query(&week),
        });
    }
    datasets
}

/// Fetch and publish every dataset in order, then log the run. The first
/// failure propagates immediately: later datasets are not attempted and the
/// log row is not written, while tabs already replaced stay replaced.
pub async fn run<W, S>(
    warehouse: &W,
    sheets: &S,
    datasets: &[Dataset],
    run_at: DateTime<Utc>,
) -> Result<Vec<DatasetOutcome>>
where
    W: QueryExecutor,
    S: SheetsApi,
{
    let mut outcomes = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        info!(dataset = dataset.label, window = %dataset.window, "fetching");
        let data = warehouse
            .execute(&dataset.query)
            .await
            .with_context(|| format!("fetching the {} dataset", dataset.label))?;
        info!(dataset = dataset.label, rows = data.row_count(), "fetched");

        writer::replace_tab(sheets, dataset.tab, &data)
            .await
            .with_context(|| format!("publishing the {} dataset", dataset.label))?;

        outcomes.push(DatasetOutcome {
            window: dataset.window,
            row_count: data.row_count(),
        });
    }

    log::ensure_log_tab(sheets).await?;
    log::append_run(
        sheets,
        &RunSummary {
            run_at,
            outcomes: outcomes.clone(),
        },
    )
    .await?;

    Ok(outcomes)
}
