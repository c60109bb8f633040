use gsheets_core::arrays::batch::Batch;
use gsheets_core::arrays::field::ColumnSchema;
use gsheets_core::grid::decode;
use gsheets_core::locator::SpreadsheetReference;
use gsheets_core::scan::GridScanner;
use gsheets_error::Result;
use gsheets_http::client::HttpClient;
use gsheets_http::transport::SheetsTransport;
use tracing::debug;

use crate::resolve::{a1_range, resolve_reference, resolve_sheet_title};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Treat the first row as column names.
    pub header: bool,
    /// Explicit sheet name. Overrides a gid in the reference.
    pub sheet: Option<String>,
    /// A1 range within the sheet, e.g. `A1:C10`.
    pub range: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            header: true,
            sheet: None,
            range: None,
        }
    }
}

/// An open read over a single sheet.
///
/// All values are fetched when opened, batches are served from memory.
#[derive(Debug)]
pub struct ScanHandle {
    reference: SpreadsheetReference,
    sheet_title: String,
    scanner: GridScanner,
}

impl ScanHandle {
    pub fn schema(&self) -> &ColumnSchema {
        self.scanner.schema()
    }

    pub fn reference(&self) -> &SpreadsheetReference {
        &self.reference
    }

    pub fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    pub fn is_exhausted(&self) -> bool {
        self.scanner.is_exhausted()
    }

    /// Produce the next batch of at most `max_rows` rows.
    ///
    /// Returns an empty batch once all rows have been produced.
    pub fn scan_next(&mut self, max_rows: usize) -> Result<Batch> {
        self.scanner.scan_next(max_rows)
    }
}

/// Open a scan, fetching the sheet's values and inferring its schema.
///
/// Fails before any batch is produced if a cell doesn't fit its column.
pub async fn open_scan<C>(
    transport: &SheetsTransport<C>,
    reference: &str,
    token: &str,
    options: &ScanOptions,
) -> Result<ScanHandle>
where
    C: HttpClient,
{
    let reference = resolve_reference(reference, options.sheet.as_deref())?;
    let sheet_title = resolve_sheet_title(transport, &reference, token).await?;
    let range = a1_range(&sheet_title, options.range.as_deref());

    let raw = transport
        .get_values(&reference.spreadsheet_id, &range, token)
        .await?;
    let grid = decode(&raw)?
        .into_result()
        .map_err(|e| e.with_field("range", &range))?;

    debug!(
        spreadsheet_id = %reference.spreadsheet_id,
        %range,
        rows = grid.num_rows(),
        "fetched sheet values"
    );

    let scanner = GridScanner::try_new(grid, options.header)
        .map_err(|e| e.with_field("range", &range))?;

    Ok(ScanHandle {
        reference,
        sheet_title,
        scanner,
    })
}
