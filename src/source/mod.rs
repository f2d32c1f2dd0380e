pub mod snowflake;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub use snowflake::{normalize_account, Snowflake, SnowflakeConfig};

/// One spreadsheet-safe scalar. The destination only accepts primitive
/// values, so everything the warehouse returns is reduced to one of these
/// before it leaves the source adapter; a missing value is the empty text
/// cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Text(s) if s.is_empty())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// Column names plus positionally aligned rows, the currency between the
/// warehouse adapter and the sheet writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    /// Every row must carry exactly one value per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                bail!(
                    "row {} has {} values but the result has {} columns",
                    i,
                    row.len(),
                    headers.len()
                );
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header row followed by the data rows, the exact shape the sheet
    /// write call takes.
    pub fn to_values(&self) -> Vec<Vec<Cell>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.headers.iter().map(|h| Cell::from(h.as_str())).collect());
        values.extend(self.rows.iter().cloned());
        values
    }
}

/// The seam in front of the warehouse: one query string in, one normalized
/// result out. Tests drive the sync with scripted implementations.
pub trait QueryExecutor {
    async fn execute(&self, sql: &str) -> Result<ResultSet>;
}
