//! Decoding of spreadsheet API responses.

use gsheets_error::{ErrorKind, Result, SheetsError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Orientation of a values matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MajorDimension {
    Rows,
    Columns,
}

/// A decoded range of values.
///
/// Rows may be ragged. A row with fewer cells than the widest row has
/// implicitly empty trailing cells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub range: String,
    pub major_dimension: MajorDimension,
    /// Omitted by the API when the range holds no values.
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl Grid {
    /// Create a row-major grid from already split rows.
    pub fn from_rows(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Grid {
            range: range.into(),
            major_dimension: MajorDimension::Rows,
            values,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.values.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.values.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn row(&self, idx: usize) -> Option<&[String]> {
        self.values.get(idx).map(|r| r.as_slice())
    }

    /// Get a cell, returning an empty string for missing cells.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.values
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Convert to a row-major grid, transposing if needed.
    pub fn into_row_major(self) -> Self {
        if self.major_dimension == MajorDimension::Rows {
            return self;
        }

        let num_rows = self.width();
        let num_cols = self.values.len();

        let mut rows = vec![Vec::with_capacity(num_cols); num_rows];
        for (col_idx, column) in self.values.into_iter().enumerate() {
            for (row_idx, cell) in column.into_iter().enumerate() {
                let row = &mut rows[row_idx];
                // Pad gaps left by shorter columns.
                row.resize(col_idx, String::new());
                row.push(cell);
            }
        }

        Grid {
            range: self.range,
            major_dimension: MajorDimension::Rows,
            values: rows,
        }
    }
}

/// Error object reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// A decoded response, either the expected success shape or an error
/// reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    Error(ApiError),
}

impl<T> ApiResponse<T> {
    /// Convert an API error into an error result.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Error(err) => Err(SheetsError::api(err.code, err.message)),
        }
    }
}

pub type ValuesResponse = ApiResponse<Grid>;

/// Decode the response of a values read.
pub fn decode(raw: &str) -> Result<ValuesResponse> {
    decode_response(raw)
}

/// Decode a response into either `T` or an API error.
///
/// Anything that isn't an error object and doesn't deserialize as `T` is a
/// malformed response.
pub fn decode_response<T: DeserializeOwned>(raw: &str) -> Result<ApiResponse<T>> {
    let json = extract_json_object(raw)?;
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        SheetsError::with_source("Failed to parse response as json", Box::new(e))
            .set_kind(ErrorKind::MalformedResponse)
    })?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value).map_err(|e| {
            SheetsError::with_source("Failed to decode error response", Box::new(e))
                .set_kind(ErrorKind::MalformedResponse)
        })?;
        trace!(code = envelope.error.code, "decoded api error");
        return Ok(ApiResponse::Error(envelope.error));
    }

    let resp = serde_json::from_value(value).map_err(|e| {
        SheetsError::with_source("Response does not contain expected fields", Box::new(e))
            .set_kind(ErrorKind::MalformedResponse)
            .with_field("response", truncate(json, 256))
    })?;

    Ok(ApiResponse::Ok(resp))
}

/// Find the outermost json object in a response.
///
/// Uses the first `{` and the last `}`, tolerating anything the transport
/// left before or after the object.
pub fn extract_json_object(raw: &str) -> Result<&str> {
    let start = raw
        .find('{')
        .ok_or_else(|| SheetsError::malformed_response("No JSON object found in the response"))?;
    let end = raw.rfind('}').ok_or_else(|| {
        SheetsError::malformed_response("No closing brace found in the JSON response")
    })?;

    if end < start {
        return Err(SheetsError::malformed_response(
            "Closing brace precedes opening brace in the JSON response",
        ));
    }

    Ok(&raw[start..=end])
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
