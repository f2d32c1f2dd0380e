use crate::window::DateWindow;

/// Budget-vs-actual rows joined with work-item detail, restricted to work
/// items starting inside `window` (inclusive on both ends). Minute counts
/// are converted to hours in the projection so the sheet never sees raw
/// minutes; `REMAINING` goes negative when a work item is overrun.
pub fn budget_query(window: &DateWindow) -> String {
    format!(
        r#"SELECT
  wiba.WORK_ITEM_ID,
  TRIM(wiba.WORK_TITLE) AS WORK_TITLE,
  wiba.WORK_TYPE,
  TRIM(wid.CLIENT) AS CLIENT,
  CONCAT_WS(' ', TRIM(wiba.WORK_TITLE), TRIM(wid.CLIENT)) AS WORK_CLIENT,
  wiba.USER_ID,
  wiba.USER_NAME,
  wiba.ROLE_NAME,
  wiba.TASK_TYPE,
  wid.SECONDARY_STATUS,
  ROUND(wid.BUDGETED_MINUTES / 60.0, 1) AS TOTAL_HOURS,
  wid.BUDGET_REMAINING_HOURS,
  ROUND(wiba.BUDGETED_MINUTES / 60.0, 1) AS BUDGETED_HOURS,
  ROUND(wiba.ACTUAL_MINUTES / 60.0, 1) AS ACTUAL_HOURS,
  ROUND((wiba.BUDGETED_MINUTES / 60.0) - (wiba.ACTUAL_MINUTES / 60.0), 1) AS REMAINING,
  TO_DATE(wid.START_DATETIME) AS START_DATE,
  TO_DATE(wid.DUE_DATETIME) AS DUE_DATE
FROM WORK_ITEM_BUDGET_VS_ACTUAL wiba
JOIN WORK_ITEM_DETAILS wid
  ON wiba.WORK_ITEM_ID = wid.WORK_ITEM_ID
WHERE wiba.BUDGETED_MINUTES >= 0
  AND wid.START_DATETIME BETWEEN '{start}' AND '{end}'
ORDER BY wiba.WORK_ITEM_ID ASC"#,
        start = window.start(),
        end = window.end(),
    )
}

/// Time entries carry whatever schema the source table exposes; the window
/// on the reporting date is the only restriction.
pub fn time_entries_query(window: &DateWindow) -> String {
    format!(
        "SELECT * FROM TIME_ENTRIES WHERE REPORTING_DATE BETWEEN '{start}' AND '{end}'",
        start = window.start(),
        end = window.end(),
    )
}
