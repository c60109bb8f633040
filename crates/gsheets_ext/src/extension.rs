use gsheets_error::Result;
use gsheets_http::client::HttpClient;
use gsheets_http::transport::SheetsTransport;
use tracing::debug;

use crate::config::GsheetsConfig;
use crate::copy_to::{WriteHandle, WriteOptions, open_write};
use crate::read_gsheet::{ScanHandle, ScanOptions, open_scan};
use crate::secret::CredentialProvider;

/// Entry point for reading and writing spreadsheets.
///
/// A token is requested from the credential provider for every open.
#[derive(Debug)]
pub struct GsheetsExtension<C: HttpClient, P> {
    transport: SheetsTransport<C>,
    credentials: P,
    config: GsheetsConfig,
}

impl<C, P> GsheetsExtension<C, P>
where
    C: HttpClient,
    P: CredentialProvider,
{
    pub fn new(client: C, credentials: P, config: GsheetsConfig) -> Self {
        let transport = SheetsTransport::new(client, config.api_host.clone());
        GsheetsExtension {
            transport,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &GsheetsConfig {
        &self.config
    }

    pub fn transport(&self) -> &SheetsTransport<C> {
        &self.transport
    }

    async fn token(&self) -> Result<String> {
        self.credentials.get_token(&self.config.profile).await
    }

    /// Open a read over a spreadsheet.
    pub async fn open_scan(&self, reference: &str, options: &ScanOptions) -> Result<ScanHandle> {
        let token = self.token().await?;
        let handle = open_scan(&self.transport, reference, &token, options).await?;
        debug!(
            sheet = %handle.sheet_title(),
            columns = handle.schema().num_columns(),
            "opened scan"
        );
        Ok(handle)
    }

    /// Open a write to a spreadsheet. The target sheet is cleared.
    pub async fn open_write(
        &self,
        reference: &str,
        columns: Vec<String>,
        options: &WriteOptions,
    ) -> Result<WriteHandle<C>> {
        let token = self.token().await?;
        let handle = open_write(&self.transport, reference, &token, columns, options).await?;
        debug!(sheet = %handle.session().sheet_name(), "opened write");
        Ok(handle)
    }
}
