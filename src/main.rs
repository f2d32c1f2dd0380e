use anyhow::Result;
use budgetsync::{config::Config, sheets::SheetsClient, source::Snowflake, sync};
use chrono::{Local, Utc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) load configuration, fail fast ────────────────────────────
    let config = Config::from_env()?;

    // "today" and the run timestamp are evaluated once and reused so a run
    // straddling midnight cannot skew between datasets.
    let today = Local::now().date_naive();
    let run_at = Utc::now();

    // ─── 3) plan the datasets for this run ───────────────────────────
    let datasets = sync::plan(config.budget_window, config.sync_time_entries, today);
    for dataset in &datasets {
        info!(
            dataset = dataset.label,
            tab = dataset.tab,
            start = %dataset.window.start(),
            end = %dataset.window.end(),
            "planned"
        );
    }

    // ─── 4) connect and run ──────────────────────────────────────────
    let warehouse = Snowflake::new(config.snowflake)?;
    let sheets = SheetsClient::connect(config.sheets).await?;

    let outcomes = sync::run(&warehouse, &sheets, &datasets, run_at).await?;
    for (dataset, outcome) in datasets.iter().zip(&outcomes) {
        info!(
            dataset = dataset.label,
            rows = outcome.row_count,
            "synced"
        );
    }

    info!("all done");
    Ok(())
}
