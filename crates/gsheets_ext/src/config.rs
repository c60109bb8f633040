use gsheets_http::transport::DEFAULT_API_HOST;

pub const DEFAULT_BATCH_SIZE: usize = 2048;
pub const DEFAULT_PROFILE: &str = "default";

/// Settings shared by reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsheetsConfig {
    /// Host serving the spreadsheet API.
    pub api_host: String,
    /// Max number of rows per scanned batch.
    pub batch_size: usize,
    /// Credential profile used to look up tokens.
    pub profile: String,
}

impl Default for GsheetsConfig {
    fn default() -> Self {
        GsheetsConfig {
            api_host: DEFAULT_API_HOST.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            profile: DEFAULT_PROFILE.to_string(),
        }
    }
}
