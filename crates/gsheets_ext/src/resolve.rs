use gsheets_core::locator::{SheetSelector, SpreadsheetReference};
use gsheets_error::Result;
use gsheets_http::client::HttpClient;
use gsheets_http::metadata::SheetMetadata;
use gsheets_http::transport::SheetsTransport;
use tracing::debug;

/// Sheet used when the reference doesn't select one.
pub const DEFAULT_SHEET_ID: i64 = 0;

/// Resolve a reference and an optional explicit sheet name.
///
/// An explicit name overrides any gid found in the reference.
pub fn resolve_reference(reference: &str, sheet: Option<&str>) -> Result<SpreadsheetReference> {
    let resolved = SpreadsheetReference::resolve(reference)?;
    Ok(match sheet {
        Some(name) => resolved.with_sheet_name(name),
        None => resolved,
    })
}

/// Get the title of the sheet the reference points to.
///
/// Always fetches metadata. A name that isn't in the spreadsheet fails with
/// `SheetNotFound`.
pub async fn resolve_sheet_title<C>(
    transport: &SheetsTransport<C>,
    reference: &SpreadsheetReference,
    token: &str,
) -> Result<String>
where
    C: HttpClient,
{
    let metadata = SheetMetadata::fetch(transport, &reference.spreadsheet_id, token).await?;

    let (sheet_id, title) = match &reference.sheet_selector {
        SheetSelector::ByName(name) => (metadata.id_for_title(name)?, name.clone()),
        SheetSelector::ById(gid) => (*gid, metadata.title_for_id(*gid)?.to_string()),
        SheetSelector::Unspecified => (
            DEFAULT_SHEET_ID,
            metadata.title_for_id(DEFAULT_SHEET_ID)?.to_string(),
        ),
    };
    debug!(%sheet_id, %title, "resolved sheet title");

    Ok(title)
}

/// Build an A1 range for a sheet, optionally restricted to a sub-range.
///
/// The title is always quoted so that titles like `Q1` aren't read as a cell.
pub fn a1_range(title: &str, range: Option<&str>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match range {
        Some(range) => format!("{quoted}!{range}"),
        None => quoted,
    }
}
