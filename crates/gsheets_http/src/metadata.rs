use gsheets_core::grid::decode_response;
use gsheets_error::{Result, SheetsError};
use serde::Deserialize;
use tracing::debug;

use crate::client::HttpClient;
use crate::transport::SheetsTransport;

/// Properties of a single sheet (tab) within a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

/// Sheet listing of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetMetadata {
    pub sheets: Vec<SheetProperties>,
}

impl SheetMetadata {
    /// Decode a metadata response body.
    pub fn decode(raw: &str) -> Result<Self> {
        let resp: MetadataResponse = decode_response(raw)?.into_result()?;
        Ok(SheetMetadata {
            sheets: resp.sheets.into_iter().map(|s| s.properties).collect(),
        })
    }

    /// Fetch sheet metadata for a spreadsheet.
    pub async fn fetch<C>(
        transport: &SheetsTransport<C>,
        spreadsheet_id: &str,
        token: &str,
    ) -> Result<Self>
    where
        C: HttpClient,
    {
        let raw = transport.get_metadata(spreadsheet_id, token).await?;
        let metadata = Self::decode(&raw)?;
        debug!(%spreadsheet_id, sheets = metadata.sheets.len(), "fetched sheet metadata");
        Ok(metadata)
    }

    pub fn title_for_id(&self, sheet_id: i64) -> Result<&str> {
        self.sheets
            .iter()
            .find(|s| s.sheet_id == sheet_id)
            .map(|s| s.title.as_str())
            .ok_or_else(|| {
                SheetsError::sheet_not_found(format!("No sheet with id {sheet_id} in spreadsheet"))
                    .with_field("sheet_id", sheet_id)
            })
    }

    pub fn id_for_title(&self, title: &str) -> Result<i64> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.sheet_id)
            .ok_or_else(|| {
                SheetsError::sheet_not_found(format!("No sheet named '{title}' in spreadsheet"))
                    .with_field("sheet", title)
            })
    }
}
