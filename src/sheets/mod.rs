pub mod auth;
pub mod google;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::row::header_cells;

/// Append-only view of the worksheet rows are written to.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Every non-empty row currently in the worksheet, header included.
    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Append one row after the last non-empty row.
    async fn append_row(&self, row: &[String]) -> Result<()>;
}

/// Write the header row if the worksheet has no rows at all.
///
/// Returns `true` when the header was written.
pub async fn ensure_header(sheet: &dyn SheetBackend) -> Result<bool> {
    if !sheet.get_all_rows().await?.is_empty() {
        return Ok(false);
    }
    sheet.append_row(&header_cells()).await?;
    info!("Sheet was empty, wrote header row");
    Ok(true)
}
