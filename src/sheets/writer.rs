use anyhow::{Context, Result};
use tracing::info;

use super::SheetsApi;
use crate::source::ResultSet;

/// Replace the full contents of `tab` with the result's header row plus its
/// data rows, anchored at the top-left cell. Stale rows from earlier runs
/// are dropped by the clear; there is no recovery between the two calls, so
/// a failed write leaves the tab empty until the next successful run.
pub async fn replace_tab<S: SheetsApi>(sheets: &S, tab: &str, data: &ResultSet) -> Result<()> {
    sheets
        .clear(tab)
        .await
        .with_context(|| format!("clearing tab {tab:?}"))?;

    let values = data.to_values();
    sheets
        .update(&format!("{tab}!A1"), &values)
        .await
        .with_context(|| format!("writing tab {tab:?}"))?;

    info!(tab, rows = data.row_count(), "tab replaced");
    Ok(())
}
