//! Resolve user supplied spreadsheet references.
//!
//! A reference is either a bare spreadsheet ID or a spreadsheet URL like
//! `https://docs.google.com/spreadsheets/d/<id>/edit?gid=<gid>`.

use std::fmt;
use std::sync::LazyLock;

use gsheets_error::{Result, SheetsError};
use regex::Regex;

static SPREADSHEET_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"docs\.google\.com/spreadsheets/(?:u/\d+/)?d/([a-zA-Z0-9_-]+)")
        .expect("spreadsheet url regex to be valid")
});

static GID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?#&]gid=(\d+)").expect("gid regex to be valid"));

/// Which sheet (tab) within a spreadsheet to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    ById(i64),
    ByName(String),
    Unspecified,
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(gid) => write!(f, "gid={gid}"),
            Self::ByName(name) => write!(f, "sheet '{name}'"),
            Self::Unspecified => write!(f, "unspecified sheet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetReference {
    pub raw: String,
    pub spreadsheet_id: String,
    pub sheet_selector: SheetSelector,
}

impl SpreadsheetReference {
    /// Resolve a raw reference string.
    pub fn resolve(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SheetsError::invalid_reference(
                "Spreadsheet reference cannot be empty",
            ));
        }

        // No path separator, treat as an ID.
        if !raw.contains('/') {
            return Ok(SpreadsheetReference {
                raw: raw.to_string(),
                spreadsheet_id: raw.to_string(),
                sheet_selector: SheetSelector::Unspecified,
            });
        }

        let spreadsheet_id = SPREADSHEET_URL_REGEX
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                SheetsError::invalid_reference("Invalid spreadsheet URL or ID")
                    .with_field("reference", raw)
            })?;

        let sheet_selector = match GID_REGEX.captures(raw).and_then(|caps| caps.get(1)) {
            Some(m) => {
                let gid = m.as_str().parse::<i64>().map_err(|_| {
                    SheetsError::invalid_reference("Sheet gid out of range")
                        .with_field("gid", m.as_str())
                })?;
                SheetSelector::ById(gid)
            }
            None => SheetSelector::Unspecified,
        };

        Ok(SpreadsheetReference {
            raw: raw.to_string(),
            spreadsheet_id,
            sheet_selector,
        })
    }

    /// Replace the selector with an explicit sheet name.
    ///
    /// An explicit name always takes precedence over a gid in the URL.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_selector = SheetSelector::ByName(name.into());
        self
    }
}
