pub mod client;
pub mod log;
pub mod writer;

#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;

use crate::source::Cell;

pub use client::{SheetsClient, SheetsConfig};

/// The slice of the spreadsheet service this system touches: range-level
/// read/write/append/clear plus tab listing and creation. The REST client
/// implements it against the live API; tests implement it in memory.
pub trait SheetsApi {
    /// Titles of every tab in the spreadsheet.
    async fn sheet_titles(&self) -> Result<Vec<String>>;

    /// Create an empty tab with the given title. Fails if the title exists.
    async fn add_sheet(&self, title: &str) -> Result<()>;

    /// Clear every value in the range (a bare tab name clears the tab).
    async fn clear(&self, range: &str) -> Result<()>;

    /// Write rows starting at the range anchor, overwriting what they cover.
    async fn update(&self, range: &str, values: &[Vec<Cell>]) -> Result<()>;

    /// Append rows after the last populated row of the range's table.
    async fn append(&self, range: &str, values: &[Vec<Cell>]) -> Result<()>;

    /// Read the populated rows of a range.
    async fn read(&self, range: &str) -> Result<Vec<Vec<Cell>>>;
}
