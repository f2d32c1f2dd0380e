//! In-memory stand-in for the spreadsheet service, with row-anchored update
//! semantics so header rewrites and appends interact the way the live API
//! does.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{bail, Result};

use super::SheetsApi;
use crate::source::Cell;

pub struct FakeSheets {
    tabs: Mutex<BTreeMap<String, Vec<Vec<Cell>>>>,
}

impl FakeSheets {
    /// A spreadsheet that already contains the given (empty) tabs.
    pub fn with_tabs(titles: &[&str]) -> Self {
        let tabs = titles
            .iter()
            .map(|t| (t.to_string(), Vec::new()))
            .collect();
        FakeSheets {
            tabs: Mutex::new(tabs),
        }
    }

    pub fn rows(&self, tab: &str) -> Vec<Vec<Cell>> {
        self.tabs
            .lock()
            .unwrap()
            .get(tab)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_tab(&self, tab: &str) -> bool {
        self.tabs.lock().unwrap().contains_key(tab)
    }
}

/// "Tab" or "Tab!A1"-style ranges; the anchor row is 1-based.
fn split_range(range: &str) -> (&str, usize) {
    match range.split_once('!') {
        None => (range, 1),
        Some((tab, cell)) => {
            let row: usize = cell
                .chars()
                .skip_while(|c| c.is_ascii_alphabetic())
                .collect::<String>()
                .parse()
                .unwrap_or(1);
            (tab, row.max(1))
        }
    }
}

impl SheetsApi for FakeSheets {
    async fn sheet_titles(&self) -> Result<Vec<String>> {
        Ok(self.tabs.lock().unwrap().keys().cloned().collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<()> {
        let mut tabs = self.tabs.lock().unwrap();
        if tabs.contains_key(title) {
            bail!("a sheet named {title:?} already exists");
        }
        tabs.insert(title.to_string(), Vec::new());
        Ok(())
    }

    async fn clear(&self, range: &str) -> Result<()> {
        let (tab, _) = split_range(range);
        let mut tabs = self.tabs.lock().unwrap();
        match tabs.get_mut(tab) {
            Some(rows) => {
                rows.clear();
                Ok(())
            }
            None => bail!("unknown range {range:?}"),
        }
    }

    async fn update(&self, range: &str, values: &[Vec<Cell>]) -> Result<()> {
        let (tab, anchor) = split_range(range);
        let mut tabs = self.tabs.lock().unwrap();
        let rows = match tabs.get_mut(tab) {
            Some(rows) => rows,
            None => bail!("unknown range {range:?}"),
        };
        let start = anchor - 1;
        if rows.len() < start + values.len() {
            rows.resize(start + values.len(), Vec::new());
        }
        for (offset, value) in values.iter().enumerate() {
            rows[start + offset] = value.clone();
        }
        Ok(())
    }

    async fn append(&self, range: &str, values: &[Vec<Cell>]) -> Result<()> {
        let (tab, _) = split_range(range);
        let mut tabs = self.tabs.lock().unwrap();
        match tabs.get_mut(tab) {
            Some(rows) => {
                rows.extend(values.iter().cloned());
                Ok(())
            }
            None => bail!("unknown range {range:?}"),
        }
    }

    async fn read(&self, range: &str) -> Result<Vec<Vec<Cell>>> {
        let (tab, anchor) = split_range(range);
        let tabs = self.tabs.lock().unwrap();
        match tabs.get(tab) {
            Some(rows) => Ok(rows.iter().skip(anchor - 1).cloned().collect()),
            None => bail!("unknown range {range:?}"),
        }
    }
}
